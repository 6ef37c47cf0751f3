//! Front matter and wiki link extraction
//!
//! A page may start with a YAML block between two `---` lines:
//!
//! ```text
//! ---
//! status: draft
//! tags:
//!   - rust
//!   - wiki
//! ---
//! See [[HomePage]] and [[About|the about page]].
//! ```
//!
//! Parsing never fails. Broken front matter yields no metadata and the
//! remaining text is still scanned for links.

use meshgraph_core::{Metadata, ParsedLink};
use serde_yaml::Value;
use std::collections::HashSet;

/// Line that opens and closes the front matter block.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Result of parsing one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    pub metadata: Metadata,
    /// Unique link targets in first-occurrence order.
    pub links: Vec<ParsedLink>,
    /// Content without front matter.
    pub body: String,
}

/// Parse a complete page.
pub fn parse_page(content: &str) -> ParsedPage {
    let (metadata, body) = match split_frontmatter(content) {
        Some((yaml, body)) => (metadata_from_yaml(yaml), body),
        None => (Metadata::new(), content),
    };
    ParsedPage {
        metadata,
        links: extract_wiki_links(body),
        body: body.to_string(),
    }
}

/// Metadata from the front matter block, empty if absent or malformed.
pub fn parse_frontmatter(content: &str) -> Metadata {
    split_frontmatter(content)
        .map(|(yaml, _)| metadata_from_yaml(yaml))
        .unwrap_or_default()
}

/// Content after the front matter block, or the whole content if there is none.
pub fn strip_frontmatter(content: &str) -> &str {
    split_frontmatter(content).map_or(content, |(_, body)| body)
}

/// Split into `(yaml, body)`. The opening delimiter must be the first
/// non-blank line and the block must be closed.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start().strip_prefix(FRONTMATTER_DELIMITER)?;
    let newline = rest.find('\n')?;
    if !rest[..newline].trim().is_empty() {
        return None;
    }
    let block = &rest[newline + 1..];

    let mut offset = 0;
    for line in block.split_inclusive('\n') {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            let body = &block[offset + line.len()..];
            return Some((&block[..offset], body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    None
}

fn metadata_from_yaml(yaml: &str) -> Metadata {
    let mut metadata = Metadata::new();
    let mapping = match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(Value::Null) => return metadata,
        Ok(_) => {
            tracing::debug!("Front matter is not a mapping, ignoring");
            return metadata;
        }
        Err(e) => {
            tracing::debug!("Malformed front matter: {}", e);
            return metadata;
        }
    };

    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            continue;
        };
        let values = yaml_value_to_strings(&value);
        if !values.is_empty() {
            metadata.insert(key, values);
        }
    }
    metadata
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// Scalars become one value, sequences flatten; nulls and nested mappings are dropped.
fn yaml_value_to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(seq) => seq.iter().flat_map(yaml_value_to_strings).collect(),
        Value::Tagged(tagged) => yaml_value_to_strings(&tagged.value),
        Value::Null | Value::Mapping(_) => Vec::new(),
        scalar => scalar_to_string(scalar).into_iter().collect(),
    }
}

/// Extract `[[Target]]` and `[[Target|Label]]` links.
///
/// Target and label are trimmed, empty targets and unterminated or
/// multi-line brackets are skipped, and repeated targets keep their first
/// occurrence.
pub fn extract_wiki_links(content: &str) -> Vec<ParsedLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = content;

    while let Some(open) = rest.find("[[") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("]]") else {
            break;
        };
        let mut inner = &after_open[..close];
        // `[[a [[b]]` links to `b`
        if let Some(nested) = inner.rfind("[[") {
            inner = &inner[nested + 2..];
        }
        rest = &after_open[close + 2..];

        if inner.contains('\n') {
            continue;
        }
        let (target, label) = match inner.split_once('|') {
            Some((target, label)) => (target.trim(), Some(label.trim())),
            None => (inner.trim(), None),
        };
        if target.is_empty() || !seen.insert(target.to_string()) {
            continue;
        }
        links.push(ParsedLink {
            target: target.to_string(),
            label: label.map(str::to_string),
        });
    }

    links
}
