//! Background filesystem watching
//!
//! Events are debounced per path by `notify-debouncer-mini`; each settled
//! batch is applied to the shared graph on a worker thread and the resulting
//! events are appended to the queue.

use crate::sync::{SharedGraph, apply_paths};
use meshgraph_core::EventQueue;
use meshgraph_indexer::DocumentFilter;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{
    DebounceEventResult, DebouncedEvent, DebouncedEventKind, Debouncer, new_debouncer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default quiet period before a changed file is re-read.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Upper bound on how long the worker sleeps before checking for shutdown.
const IDLE_TICK: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Watch root {0} does not exist or is not a directory")]
    RootUnavailable(PathBuf),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Failed to spawn watcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Quiet period a path needs before it is applied.
    pub debounce: Duration,
    pub filter: DocumentFilter,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            filter: DocumentFilter::default(),
        }
    }
}

/// A running watch over one wiki root.
///
/// Dropping the watcher stops it.
pub struct FileWatcher {
    root: PathBuf,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl FileWatcher {
    /// Start watching `root` recursively.
    ///
    /// Fails if the root is not a directory or the OS watch cannot be set up.
    pub fn start(
        root: &Path,
        graph: Arc<SharedGraph>,
        queue: EventQueue,
        config: WatcherConfig,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(WatchError::RootUnavailable(root.to_path_buf()));
        }

        let (tx, rx) = channel::<DebounceEventResult>();
        let mut debouncer = new_debouncer(config.debounce, tx)?;
        debouncer.watcher().watch(root, RecursiveMode::Recursive)?;

        let stop = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            root: root.to_path_buf(),
            graph,
            queue,
            filter: config.filter,
            stop: Arc::clone(&stop),
        };
        let handle = std::thread::Builder::new()
            .name("meshgraph-watcher".to_string())
            .spawn(move || worker.run(rx))
            .map_err(WatchError::Spawn)?;

        info!("Watching directory: {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
            stop,
            worker: Some(handle),
            debouncer: Some(debouncer),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop watching and wait for the worker to exit.
    ///
    /// Changes that have not settled yet are discarded.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // pending paths die with the debouncer
        self.debouncer.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Watcher thread panicked");
            }
            info!("Stopped watching {}", self.root.display());
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("root", &self.root)
            .field("running", &self.is_running())
            .finish()
    }
}

struct Worker {
    root: PathBuf,
    graph: Arc<SharedGraph>,
    queue: EventQueue,
    filter: DocumentFilter,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, rx: Receiver<DebounceEventResult>) {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            match rx.recv_timeout(IDLE_TICK) {
                Ok(Ok(batch)) => {
                    if self.stop.load(Ordering::SeqCst) {
                        debug!("Discarding {} settled paths on shutdown", batch.len());
                        break;
                    }
                    self.apply(batch);
                }
                Ok(Err(e)) => warn!("File system watch error: {}", e),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn apply(&self, batch: Vec<DebouncedEvent>) {
        // a path still being written comes back as `Any` once it goes quiet
        let paths: Vec<PathBuf> = batch
            .into_iter()
            .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
            .map(|event| event.path)
            .collect();
        if paths.is_empty() {
            return;
        }

        debug!("Applying {} settled paths", paths.len());
        let events = apply_paths(&self.root, &paths, &self.filter, &self.graph);
        if !events.is_empty() {
            debug!("Batch produced {} events", events.len());
            self.queue.push_all(events);
        }
    }
}
