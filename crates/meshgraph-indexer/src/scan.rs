//! Reading pages from disk

use crate::documents::{DocumentFilter, page_name_for};
use crate::parser::parse_page;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use meshgraph_core::{PageNode, PageRecord};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a page name from {0}")]
    NoName(PathBuf),
}

impl LoadError {
    /// True if the file vanished before it could be read.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Read and parse one page file.
///
/// The stored path is relative to `root` when the file lives under it.
pub fn load_page(root: &Path, path: &Path) -> Result<PageRecord, LoadError> {
    let name = page_name_for(path).ok_or_else(|| LoadError::NoName(path.to_path_buf()))?;
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(io_err)?;
    let last_modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let parsed = parse_page(&content);

    let mut page = PageNode::new(name, relative).with_metadata(parsed.metadata);
    page.last_modified = last_modified;
    Ok(PageRecord {
        page,
        links: parsed.links,
    })
}

/// Outcome of a full directory scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Loaded pages in path order.
    pub pages: Vec<PageRecord>,
    /// Files that matched the filter but could not be loaded, or whose
    /// name was already taken by an earlier file.
    pub skipped: Vec<PathBuf>,
}

/// Walk `root` recursively and load every page file.
///
/// Files are visited in file name order so repeated scans produce the same
/// result. Unreadable files are logged and skipped. When two files share a
/// stem, the first one visited wins.
pub fn scan_directory(root: &Path, filter: &DocumentFilter) -> ScanReport {
    if !root.is_dir() {
        warn!("Wiki root {} is not a readable directory", root.display());
        return ScanReport::default();
    }
    scan_tree(root, root, filter)
}

/// Like [`scan_directory`], but only walks the subtree at `start`.
///
/// Stored paths stay relative to `root`. Duplicate stems are only detected
/// within the subtree.
pub fn scan_tree(root: &Path, start: &Path, filter: &DocumentFilter) -> ScanReport {
    let mut report = ScanReport::default();
    let mut names = HashSet::new();
    for path in document_paths(root, start, filter) {
        match load_page(root, &path) {
            Ok(record) => {
                if !names.insert(record.page.name.clone()) {
                    warn!(
                        "Page name '{}' already taken, skipping {}",
                        record.page.name,
                        path.display()
                    );
                    report.skipped.push(path);
                    continue;
                }
                debug!("Loaded page '{}'", record.page.name);
                report.pages.push(record);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.skipped.push(path);
            }
        }
    }

    info!(
        "Scanned {}: {} pages, {} skipped",
        start.display(),
        report.pages.len(),
        report.skipped.len()
    );
    report
}

/// Page files under `root` whose page name is `name`, in walk order.
pub fn find_pages_named(root: &Path, name: &str, filter: &DocumentFilter) -> Vec<PathBuf> {
    document_paths(root, root, filter)
        .filter(|path| page_name_for(path).as_deref() == Some(name))
        .collect()
}

fn document_paths<'a>(
    root: &'a Path,
    start: &Path,
    filter: &'a DocumentFilter,
) -> impl Iterator<Item = PathBuf> + 'a {
    WalkBuilder::new(start)
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cannot read entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(move |path| filter.is_document(root, path))
}
