//! Test utilities for building small page graphs

use crate::model::{Metadata, PageNode, PageRecord, ParsedLink};

/// A page with `key: [values]` metadata.
pub fn page_with(name: &str, metadata: &[(&str, &[&str])]) -> PageNode {
    let metadata: Metadata = metadata
        .iter()
        .map(|(key, values)| {
            (
                key.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect();
    PageNode::new(name, format!("{name}.md")).with_metadata(metadata)
}

/// A record linking `name` to each of `targets`.
pub fn record(name: &str, metadata: &[(&str, &[&str])], targets: &[&str]) -> PageRecord {
    PageRecord {
        page: page_with(name, metadata),
        links: targets.iter().map(|t| ParsedLink::new(*t)).collect(),
    }
}
