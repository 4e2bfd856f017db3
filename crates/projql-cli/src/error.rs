//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A query file is not valid JSON or does not match the query layout.
    #[error("invalid query file {path}: {source}")]
    QueryFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Building or running the query failed.
    #[error(transparent)]
    Core(#[from] projql_core::Error),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
