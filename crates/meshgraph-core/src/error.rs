//! Error types for graph mutation and queries

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Outgoing links can only be attached to an existing page.
    #[error("unknown page: {0}")]
    UnknownPage(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid pattern `{pattern}` in Matches filter: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
