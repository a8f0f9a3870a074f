//! Fatal error types for trace matrix runs
//!
//! Only failures that abort a run live here. A row that fails a filtering or
//! validation predicate is not an error: it becomes a
//! [`RejectedRow`](crate::trace::RejectedRow) and processing continues.

use thiserror::Error;

/// Errors that abort a trace matrix run before any output is written
#[derive(Debug, Error)]
pub enum TraceError {
    /// An external input (record batch, id list, link list) could not be
    /// parsed
    #[error("input error: {0}")]
    Input(String),

    /// The run configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// A required identity column or field is missing
    #[error("identity error: {0}")]
    Identity(String),

    /// Writing the matrix, error log or summary failed
    #[error("export error: {0}")]
    Export(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trace matrix operations
pub type TraceResult<T> = Result<T, TraceError>;
