//! Filter evaluation and MetaTable projection over the page graph

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::graph::Graph;
use crate::model::PageNode;

/// A predicate over a page's metadata or links. Filters combine with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    /// Some value under `key` equals `value` exactly.
    Equals { key: String, value: String },
    /// `key` has at least one value.
    HasKey { key: String },
    /// Some value under `key` contains `substring`.
    Contains { key: String, substring: String },
    /// Some value under `key` matches the regular expression `pattern`.
    Matches { key: String, pattern: String },
    /// The page links to `page`.
    LinksTo { page: String },
    /// `page` links to the page.
    LinkedFrom { page: String },
}

impl Filter {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn has_key(key: impl Into<String>) -> Self {
        Filter::HasKey { key: key.into() }
    }

    pub fn contains(key: impl Into<String>, substring: impl Into<String>) -> Self {
        Filter::Contains {
            key: key.into(),
            substring: substring.into(),
        }
    }

    pub fn matches(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Matches {
            key: key.into(),
            pattern: pattern.into(),
        }
    }

    pub fn links_to(page: impl Into<String>) -> Self {
        Filter::LinksTo { page: page.into() }
    }

    pub fn linked_from(page: impl Into<String>) -> Self {
        Filter::LinkedFrom { page: page.into() }
    }
}

/// A filter ready for evaluation; regexes are compiled once per query.
enum Predicate<'a> {
    Plain(&'a Filter),
    Regex { key: &'a str, regex: Regex },
}

impl Predicate<'_> {
    fn compile(filters: &[Filter]) -> Result<Vec<Predicate<'_>>, QueryError> {
        filters
            .iter()
            .map(|filter| match filter {
                Filter::Matches { key, pattern } => Regex::new(pattern)
                    .map(|regex| Predicate::Regex { key, regex })
                    .map_err(|source| QueryError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }),
                other => Ok(Predicate::Plain(other)),
            })
            .collect()
    }

    fn test(&self, page: &PageNode, graph: &Graph) -> bool {
        match self {
            Predicate::Regex { key, regex } => page.values(key).iter().any(|v| regex.is_match(v)),
            Predicate::Plain(filter) => match filter {
                Filter::Equals { key, value } => page.values(key).contains(value),
                Filter::HasKey { key } => !page.values(key).is_empty(),
                Filter::Contains { key, substring } => page
                    .values(key)
                    .iter()
                    .any(|v| v.contains(substring.as_str())),
                Filter::LinksTo { page: target } => graph.has_link(&page.name, target),
                Filter::LinkedFrom { page: source } => graph.has_link(source, &page.name),
                // compiled into Predicate::Regex
                Filter::Matches { .. } => false,
            },
        }
    }
}

/// Pages matching every filter, ascending by name. No filters returns all pages.
///
/// An invalid `Matches` pattern fails the call before any page is examined.
pub fn query(graph: &Graph, filters: &[Filter]) -> Result<Vec<PageNode>, QueryError> {
    let predicates = Predicate::compile(filters)?;
    Ok(graph
        .list_nodes()
        .into_iter()
        .filter(|page| predicates.iter().all(|p| p.test(page, graph)))
        .cloned()
        .collect())
}

/// A projected result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTable {
    pub columns: Vec<String>,
    pub rows: Vec<MetaTableRow>,
}

impl MetaTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTableRow {
    pub page: String,
    pub cells: BTreeMap<String, String>,
}

impl MetaTableRow {
    /// Cell value for `column`; empty if the column was not requested.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Separator for multi-valued cells.
pub const VALUE_SEPARATOR: &str = ", ";

/// Run [`query`] and project each page onto `columns`.
///
/// `name` is the page name and `file_path` its relative path; any other
/// column is the page's values for that key joined with [`VALUE_SEPARATOR`],
/// or empty if the key is absent.
pub fn metatable(
    graph: &Graph,
    filters: &[Filter],
    columns: &[String],
) -> Result<MetaTable, QueryError> {
    let rows = query(graph, filters)?
        .into_iter()
        .map(|page| {
            let cells = columns
                .iter()
                .map(|column| (column.clone(), project(&page, column)))
                .collect();
            MetaTableRow {
                page: page.name,
                cells,
            }
        })
        .collect();

    Ok(MetaTable {
        columns: columns.to_vec(),
        rows,
    })
}

fn project(page: &PageNode, column: &str) -> String {
    match column {
        "name" => page.name.clone(),
        "file_path" => page.file_path.to_string_lossy().into_owned(),
        key => page.values(key).join(VALUE_SEPARATOR),
    }
}

/// Filters and columns parsed from the MetaTable macro argument syntax.
///
/// ```text
/// status=draft, tags~=doc, title/=^A, reviewed?, ->Roadmap, <-Index, ||name||status||
/// ```
///
/// `=` Equals, `~=` Contains, `/=` Matches, trailing `?` HasKey, `->` LinksTo,
/// `<-` LinkedFrom. Columns follow the first `||`. Unrecognised terms are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTableSpec {
    pub filters: Vec<Filter>,
    pub columns: Vec<String>,
}

impl MetaTableSpec {
    pub fn parse(args: &str) -> Self {
        let (filter_part, column_part) = match args.find("||") {
            Some(pos) => (&args[..pos], &args[pos..]),
            None => (args, ""),
        };

        let columns = column_part
            .split("||")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        let filters = filter_part
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .filter_map(|term| {
                let filter = parse_term(term);
                if filter.is_none() {
                    tracing::debug!("Skipping unrecognised MetaTable term: {}", term);
                }
                filter
            })
            .collect();

        MetaTableSpec { filters, columns }
    }
}

fn parse_term(term: &str) -> Option<Filter> {
    if let Some(page) = term.strip_prefix("->") {
        return non_empty(page).map(Filter::links_to);
    }
    if let Some(page) = term.strip_prefix("<-") {
        return non_empty(page).map(Filter::linked_from);
    }
    if let Some(eq) = term.find('=') {
        let (lhs, value) = (&term[..eq], term[eq + 1..].trim());
        return if let Some(key) = lhs.strip_suffix('~') {
            non_empty(key).map(|k| Filter::contains(k, value))
        } else if let Some(key) = lhs.strip_suffix('/') {
            non_empty(key).map(|k| Filter::matches(k, value))
        } else {
            non_empty(lhs).map(|k| Filter::equals(k, value))
        };
    }
    term.strip_suffix('?').and_then(non_empty).map(Filter::has_key)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
