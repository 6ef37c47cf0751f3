//! CLI command implementations

use meshgraph_core::MetaTableSpec;
use meshgraph_engine::{Engine, EngineConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Explicit `--config` wins, then `<root>/meshgraph.toml`, then defaults.
/// An explicit `--root` always overrides the root from the file.
pub fn resolve_config(
    root: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<EngineConfig> {
    let mut config = match config_path {
        Some(path) => EngineConfig::load(&path)?,
        None => {
            let root = root.clone().unwrap_or_else(|| PathBuf::from("."));
            EngineConfig::discover(&root)?
        }
    };
    if let Some(root) = root {
        config.root = root;
    }
    tracing::debug!("Using config {:?}", config);
    Ok(config)
}

pub fn index(mut config: EngineConfig, dangling: bool) -> anyhow::Result<()> {
    config.watch = false;
    let engine = Engine::open(config)?;

    println!(
        "{} pages, {} links",
        engine.page_count(),
        engine.link_count()
    );
    let dangling_links = engine.dangling_links();
    println!("{} dangling links", dangling_links.len());
    if dangling {
        for (from, to) in dangling_links {
            println!("  {} -> {}", from, to);
        }
    }
    Ok(())
}

pub fn query(mut config: EngineConfig, args: &str, json: bool) -> anyhow::Result<()> {
    config.watch = false;
    let engine = Engine::open(config)?;
    let spec = MetaTableSpec::parse(args);
    tracing::debug!("Parsed query: {:?}", spec);

    if spec.columns.is_empty() {
        let pages = engine.query(&spec.filters)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&pages)?);
        } else {
            for page in pages {
                println!("{}", page.name);
            }
        }
        return Ok(());
    }

    let table = engine.metatable(&spec.filters, &spec.columns)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }
    println!("{}", table.columns.join("\t"));
    for row in &table.rows {
        let cells: Vec<&str> = table.columns.iter().map(|c| row.get(c)).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

pub async fn watch(mut config: EngineConfig, interval_ms: u64) -> anyhow::Result<()> {
    config.watch = true;
    let engine = Engine::open(config)?;
    tracing::info!(
        "Indexed {} pages, {} links; watching for changes",
        engine.page_count(),
        engine.link_count()
    );

    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
            _ = interval.tick() => {
                for event in engine.poll_events() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        }
    }

    engine.stop_watching();
    let dropped = engine.dropped_events();
    if dropped > 0 {
        tracing::warn!("{} events were dropped before they could be printed", dropped);
    }
    Ok(())
}
