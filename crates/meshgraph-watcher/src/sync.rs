//! Applying changed paths to the graph
//!
//! Every mutation holds the [`SharedGraph`] writer lock for its whole
//! duration, disk reads included. The graph lock itself is only held for
//! in-memory updates, so readers never wait on the filesystem.

use meshgraph_core::{Graph, GraphEvent, PageRecord};
use meshgraph_indexer::{
    DocumentFilter, find_pages_named, load_page, page_name_for, scan_tree,
};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The graph shared between the engine, its readers and the watcher.
///
/// Writers (path syncs and full rescans) serialize on [`SharedGraph::writer`]
/// so a slow rescan can never overwrite a change committed while it ran.
#[derive(Debug, Default)]
pub struct SharedGraph {
    graph: Mutex<Graph>,
    writer: Mutex<()>,
}

impl SharedGraph {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(graph),
            writer: Mutex::new(()),
        }
    }

    /// Lock the graph for reading or an in-memory update.
    pub fn lock(&self) -> MutexGuard<'_, Graph> {
        self.graph.lock()
    }

    /// Exclusive right to change the graph from disk.
    ///
    /// Must be taken before [`SharedGraph::lock`], never while holding it.
    pub fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock()
    }
}

/// Bring the graph in line with the current state of `path` on disk.
///
/// An existing page file is (re)loaded; a missing one removes the page it
/// backed. A directory that appeared is scanned for pages the graph does not
/// know yet; a missing one removes every page stored beneath it (the root
/// included). Paths the filter rejects are ignored. Returns the resulting
/// events in order.
pub fn apply_path(
    root: &Path,
    path: &Path,
    filter: &DocumentFilter,
    shared: &SharedGraph,
) -> Vec<GraphEvent> {
    apply_paths(root, &[path.to_path_buf()], filter, shared)
}

/// Apply a batch of settled paths in sorted order.
///
/// Files already loaded by a directory scan earlier in the same batch are
/// not applied a second time.
pub fn apply_paths(
    root: &Path,
    paths: &[PathBuf],
    filter: &DocumentFilter,
    shared: &SharedGraph,
) -> Vec<GraphEvent> {
    let _writer = shared.writer();

    let mut sorted = paths.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut loaded = HashSet::new();
    let mut events = Vec::new();
    for path in sorted {
        if loaded.contains(&path) {
            continue;
        }
        events.extend(apply_one(root, &path, filter, shared, &mut loaded));
    }
    events
}

fn apply_one(
    root: &Path,
    path: &Path,
    filter: &DocumentFilter,
    shared: &SharedGraph,
    loaded: &mut HashSet<PathBuf>,
) -> Vec<GraphEvent> {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

    if path.is_dir() {
        return add_directory(root, path, filter, shared, loaded);
    }

    if !filter.is_document(root, path) {
        if !path.exists() {
            return remove_under(&relative, shared);
        }
        return Vec::new();
    }

    if path.is_file() {
        match load_page(root, path) {
            Ok(record) => return upsert(root, record, shared),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return Vec::new();
            }
        }
    }

    let Some(name) = page_name_for(path) else {
        return Vec::new();
    };
    remove_page(root, &name, &relative, filter, shared)
}

/// Load pages under a directory that the graph does not hold at that path.
fn add_directory(
    root: &Path,
    dir: &Path,
    filter: &DocumentFilter,
    shared: &SharedGraph,
    loaded: &mut HashSet<PathBuf>,
) -> Vec<GraphEvent> {
    if filter.is_hidden(root, dir) {
        return Vec::new();
    }

    let report = scan_tree(root, dir, filter);
    let mut events = Vec::new();
    for record in report.pages {
        loaded.insert(root.join(&record.page.file_path));
        let known = shared
            .lock()
            .get_node(&record.page.name)
            .is_some_and(|page| page.file_path == record.page.file_path);
        if known {
            continue;
        }
        events.extend(upsert(root, record, shared));
    }
    if !events.is_empty() {
        debug!("Added pages under {}", dir.display());
    }
    events
}

fn upsert(root: &Path, record: PageRecord, shared: &SharedGraph) -> Vec<GraphEvent> {
    let owner = shared
        .lock()
        .get_node(&record.page.name)
        .map(|page| page.file_path.clone());
    if let Some(owner) = owner {
        if owner != record.page.file_path && root.join(&owner).is_file() {
            warn!(
                "Page name '{}' already taken by {}, ignoring {}",
                record.page.name,
                owner.display(),
                record.page.file_path.display()
            );
            return Vec::new();
        }
    }

    let change = shared.lock().apply_page(record.page, &record.links);
    debug!(
        "Applied page '{}': +{} -{} links",
        change.name,
        change.links.added.len(),
        change.links.removed.len()
    );
    change.events()
}

/// Drop the page backed by `relative`, or hand its name to the next file
/// with the same stem if one is left.
fn remove_page(
    root: &Path,
    name: &str,
    relative: &Path,
    filter: &DocumentFilter,
    shared: &SharedGraph,
) -> Vec<GraphEvent> {
    let owned = shared
        .lock()
        .get_node(name)
        .is_some_and(|page| page.file_path == relative);
    if !owned {
        return Vec::new();
    }

    let successor = find_pages_named(root, name, filter)
        .into_iter()
        .find_map(|path| load_page(root, &path).ok());

    let mut graph = shared.lock();
    if let Some(record) = successor {
        info!(
            "Page '{}' now backed by {}",
            name,
            record.page.file_path.display()
        );
        return graph.apply_page(record.page, &record.links).events();
    }
    match graph.remove_node(name) {
        Some(removed) => {
            debug!("Removed page '{}'", name);
            removed.events()
        }
        None => Vec::new(),
    }
}

fn remove_under(prefix: &Path, shared: &SharedGraph) -> Vec<GraphEvent> {
    let mut graph = shared.lock();
    let mut names: Vec<String> = graph
        .pages()
        .filter(|page| page.file_path.starts_with(prefix))
        .map(|page| page.name.clone())
        .collect();
    names.sort();

    let mut events = Vec::new();
    for name in names {
        if let Some(removed) = graph.remove_node(&name) {
            events.extend(removed.events());
        }
    }
    if !events.is_empty() {
        debug!("Removed pages under {}", prefix.display());
    }
    events
}

/// Resolve `path` against `root` when it is relative.
pub fn absolute_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
