//! Core data structures for the page graph

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Front matter attributes: key -> ordered, non-empty list of values.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// A single page in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageNode {
    /// Page identifier (the file stem).
    pub name: String,
    /// Path of the backing file, relative to the watched root.
    pub file_path: PathBuf,
    pub metadata: Metadata,
    pub last_modified: DateTime<Utc>,
}

impl PageNode {
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        PageNode {
            name: name.into(),
            file_path: file_path.into(),
            metadata: Metadata::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Values stored under `key`, or an empty slice.
    pub fn values(&self, key: &str) -> &[String] {
        self.metadata.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Edge weight: a wiki link, optionally carrying display text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WikiLink {
    pub label: Option<String>,
}

/// A link as found in page text, before it is attached to the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedLink {
    pub target: String,
    pub label: Option<String>,
}

impl ParsedLink {
    pub fn new(target: impl Into<String>) -> Self {
        ParsedLink {
            target: target.into(),
            label: None,
        }
    }

    pub fn labeled(target: impl Into<String>, label: impl Into<String>) -> Self {
        ParsedLink {
            target: target.into(),
            label: Some(label.into()),
        }
    }
}

/// Outgoing link as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkInfo {
    pub target: String,
    pub label: Option<String>,
    /// True when no page named `target` exists yet.
    pub dangling: bool,
}

/// A fully parsed page ready to be loaded into a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub page: PageNode,
    pub links: Vec<ParsedLink>,
}
