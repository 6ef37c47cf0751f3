//! Meshgraph Core: page graph model, link diffs, queries and change events

pub mod diff;
pub mod error;
pub mod event;
pub mod graph;
pub mod model;
pub mod query;

#[cfg(test)]
mod tests;

#[cfg(test)]
pub mod test_utils;

pub use diff::{LinkDiff, PageChange, RemovedPage};
pub use error::{GraphError, QueryError};
pub use event::{DEFAULT_EVENT_CAPACITY, EventQueue, GraphEvent};
pub use graph::Graph;
pub use model::{LinkInfo, Metadata, PageNode, PageRecord, ParsedLink, WikiLink};
pub use query::{Filter, MetaTable, MetaTableRow, MetaTableSpec, metatable, query};
