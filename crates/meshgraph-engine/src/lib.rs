//! Meshgraph Engine: the embeddable handle over graph, watcher and events

pub mod config;
pub mod engine;
pub mod error;
pub mod provider;


pub use config::{CONFIG_FILE_NAME, EngineConfig};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, Result};
pub use provider::{GraphProvider, NoopGraph};
