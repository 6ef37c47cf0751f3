//! Engine configuration, optionally loaded from `meshgraph.toml`

use crate::error::ConfigError;
use meshgraph_core::DEFAULT_EVENT_CAPACITY;
use meshgraph_indexer::DocumentFilter;
use meshgraph_watcher::WatcherConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the wiki root.
pub const CONFIG_FILE_NAME: &str = "meshgraph.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the page files.
    pub root: PathBuf,
    /// Quiet period before a changed file is re-read.
    pub debounce_ms: u64,
    pub event_capacity: usize,
    /// File extensions treated as pages, without the dot.
    pub extensions: Vec<String>,
    /// Globs, relative to the root, of files to leave out.
    pub ignore: Vec<String>,
    /// Start the watcher as soon as the engine is opened.
    pub watch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            root: PathBuf::from("."),
            debounce_ms: 500,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            extensions: vec!["md".to_string()],
            ignore: Vec::new(),
            watch: false,
        }
    }
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        EngineConfig {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Read a TOML config file. A relative `root` inside the file is
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Use `<root>/meshgraph.toml` if present, defaults otherwise.
    /// The returned config always points at `root`.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config = if path.is_file() {
            Self::load(&path)?
        } else {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
            Self::default()
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn document_filter(&self) -> Result<DocumentFilter, ConfigError> {
        Ok(DocumentFilter::new(&self.extensions, &self.ignore)?)
    }

    pub fn watcher_config(&self) -> Result<WatcherConfig, ConfigError> {
        Ok(WatcherConfig {
            debounce: self.debounce(),
            filter: self.document_filter()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = EngineConfig::new("/wiki");
        assert_eq!(config.root, PathBuf::from("/wiki"));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.event_capacity, 4096);
        assert_eq!(config.extensions, vec!["md"]);
        assert!(!config.watch);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "debounce_ms = 100\nignore = [\"drafts/**\"]\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.ignore, vec!["drafts/**"]);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.root, dir.path().join("."));
    }

    #[test]
    fn discover_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::discover(dir.path()).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn bad_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "debounce_ms = \"soon\"").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn bad_ignore_glob_is_reported() {
        let config = EngineConfig {
            ignore: vec!["[oops".to_string()],
            ..EngineConfig::new("/wiki")
        };
        assert!(matches!(
            config.document_filter(),
            Err(ConfigError::IgnorePattern(_))
        ));
    }
}
