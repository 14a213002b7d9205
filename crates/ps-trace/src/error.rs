//! Error types for ps-trace.

use thiserror::Error;

/// Errors that can occur while writing a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown trace format {0:?}: expected \"gantt\" or \"csv\"")]
    UnknownFormat(String),
}

/// Alias for `Result<T, TraceError>`.
pub type TraceResult<T> = Result<T, TraceError>;
