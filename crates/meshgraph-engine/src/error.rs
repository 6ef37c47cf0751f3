//! Error types for the engine and its configuration

use meshgraph_core::QueryError;
use meshgraph_watcher::WatchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid ignore pattern: {0}")]
    IgnorePattern(#[from] globset::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
