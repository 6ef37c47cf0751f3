//! Meshgraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "meshgraph")]
#[command(about = "Live link graph over a directory of wiki pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Wiki root path (defaults to the config file's root, or the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Config file (defaults to meshgraph.toml in the root, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the wiki and print a summary
    Index {
        /// Also list dangling links
        #[arg(long)]
        dangling: bool,
    },
    /// Run a MetaTable query, e.g. "status=draft, ->Roadmap, ||name||status||"
    Query {
        args: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Watch the wiki and print graph events as JSON lines
    Watch {
        /// How often to poll for events, in milliseconds
        #[arg(long, default_value = "250")]
        interval_ms: u64,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("meshgraph={}", log_level))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("meshgraph v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = commands::resolve_config(cli.root, cli.config)?;
    tracing::info!("Wiki root: {}", config.root.display());

    match cli.command {
        Commands::Index { dangling } => commands::index(config, dangling),
        Commands::Query { args, json } => commands::query(config, &args, json),
        Commands::Watch { interval_ms } => commands::watch(config, interval_ms).await,
        Commands::Version => Ok(()),
    }
}
