//! The engine handle: graph, watcher and event queue

use crate::config::EngineConfig;
use crate::error::Result;
use meshgraph_core::{
    EventQueue, Filter, Graph, GraphEvent, LinkInfo, MetaTable, Metadata, PageNode, metatable,
    query,
};
use meshgraph_indexer::{DocumentFilter, scan_directory};
use meshgraph_watcher::{FileWatcher, SharedGraph, absolute_path, apply_path};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// A live page graph over one directory.
///
/// All reads return copies. Mutations from the watcher and from
/// [`Engine::sync_path`] / [`Engine::rebuild`] are serialized on the
/// [`SharedGraph`] writer lock.
pub struct Engine {
    root: PathBuf,
    config: EngineConfig,
    filter: DocumentFilter,
    graph: Arc<SharedGraph>,
    queue: EventQueue,
    watcher: Mutex<Option<FileWatcher>>,
}

impl Engine {
    /// Scan `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open(EngineConfig::new(root))
    }

    /// Scan the configured root and, if `config.watch` is set, start watching.
    ///
    /// A missing root gives an empty engine. If the watcher cannot start the
    /// scanned engine is still returned, unwatched, and the failure logged;
    /// call [`Engine::start_watching`] to retry.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let filter = config.document_filter()?;
        let root = config
            .root
            .canonicalize()
            .unwrap_or_else(|_| config.root.clone());

        let engine = Engine {
            graph: Arc::new(SharedGraph::new(load_graph(&root, &filter))),
            queue: EventQueue::with_capacity(config.event_capacity),
            watcher: Mutex::new(None),
            root,
            filter,
            config,
        };
        if engine.config.watch {
            if let Err(e) = engine.start_watching() {
                warn!("Not watching {}: {}", engine.root.display(), e);
            }
        }
        Ok(engine)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rescan the whole directory and replace the graph. Emits no events.
    ///
    /// Path updates arriving during the scan wait for it and are applied on
    /// top of the fresh graph.
    pub fn rebuild(&self) {
        let _writer = self.graph.writer();
        let fresh = load_graph(&self.root, &self.filter);
        let mut graph = self.graph.lock();
        *graph = fresh;
        info!(
            "Rebuilt graph: {} pages, {} links",
            graph.page_count(),
            graph.link_count()
        );
    }

    /// Reprocess one file (absolute or relative to the root) right away,
    /// queueing and returning the resulting events.
    pub fn sync_path(&self, path: impl AsRef<Path>) -> Vec<GraphEvent> {
        let path = absolute_path(&self.root, path.as_ref());
        let events = apply_path(&self.root, &path, &self.filter, &self.graph);
        self.queue.push_all(events.iter().cloned());
        events
    }

    pub fn list_pages(&self) -> Vec<PageNode> {
        self.graph.lock().list_nodes().into_iter().cloned().collect()
    }

    pub fn get_page(&self, name: &str) -> Option<PageNode> {
        self.graph.lock().get_node(name).cloned()
    }

    pub fn page_exists(&self, name: &str) -> bool {
        self.graph.lock().node_exists(name)
    }

    pub fn get_backlinks(&self, name: &str) -> Vec<String> {
        self.graph.lock().get_backlinks(name)
    }

    pub fn get_outlinks(&self, name: &str) -> Vec<String> {
        self.graph.lock().get_outlinks(name)
    }

    pub fn get_outlinks_detailed(&self, name: &str) -> Vec<LinkInfo> {
        self.graph.lock().outlinks_detailed(name)
    }

    pub fn get_metadata(&self, name: &str) -> Option<Metadata> {
        self.graph.lock().get_node(name).map(|page| page.metadata.clone())
    }

    pub fn page_count(&self) -> usize {
        self.graph.lock().page_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.lock().link_count()
    }

    /// `(from, to)` pairs whose target page does not exist.
    pub fn dangling_links(&self) -> Vec<(String, String)> {
        self.graph.lock().dangling_links()
    }

    /// Pages matching every filter, sorted by name.
    pub fn query(&self, filters: &[Filter]) -> Result<Vec<PageNode>> {
        Ok(query(&self.graph.lock(), filters)?)
    }

    pub fn metatable(&self, filters: &[Filter], columns: &[String]) -> Result<MetaTable> {
        Ok(metatable(&self.graph.lock(), filters, columns)?)
    }

    /// Start the background watcher, restarting it if already running.
    pub fn start_watching(&self) -> Result<()> {
        let mut slot = self.watcher.lock();
        if let Some(previous) = slot.take() {
            previous.stop();
        }
        let config = self.config.watcher_config()?;
        let watcher = FileWatcher::start(
            &self.root,
            Arc::clone(&self.graph),
            self.queue.clone(),
            config,
        )?;
        *slot = Some(watcher);
        Ok(())
    }

    /// Stop the watcher. Does nothing if it is not running.
    pub fn stop_watching(&self) {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .as_ref()
            .is_some_and(FileWatcher::is_running)
    }

    /// Take every pending event, oldest first. Never blocks on I/O.
    pub fn poll_events(&self) -> Vec<GraphEvent> {
        self.queue.poll()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Events evicted because nobody polled in time.
    pub fn dropped_events(&self) -> u64 {
        self.queue.dropped()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("graph", &self.graph)
            .field("queue", &self.queue)
            .finish()
    }
}

fn load_graph(root: &Path, filter: &DocumentFilter) -> Graph {
    if !root.is_dir() {
        warn!("Starting with an empty graph: {} is not a directory", root.display());
        return Graph::new();
    }
    let report = scan_directory(root, filter);
    Graph::from_pages(report.pages)
}

