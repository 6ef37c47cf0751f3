//! Live filesystem watching for the page graph

pub mod sync;
pub mod watcher;


pub use sync::{SharedGraph, absolute_path, apply_path, apply_paths};
pub use watcher::{DEFAULT_DEBOUNCE, FileWatcher, Result, WatchError, WatcherConfig};
