//! Construction errors for protocol types.

use thiserror::Error;

/// Errors raised while constructing filter and paging values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A range was built with a null bound.
    #[error("between requires both start and end (start: {start}, end: {end})")]
    IncompleteRange { start: String, end: String },

    /// A compound filter was built without children.
    #[error("{operator} compound filter requires at least one filter expression")]
    EmptyCompound { operator: String },

    /// Paging parameters out of range.
    #[error("invalid paging: {0}")]
    InvalidPaging(String),
}
