//! Persistence error types

use thiserror::Error;

/// Errors from loading or saving sheet snapshots
///
/// Recalculation itself never produces these; formula failures are stored as
/// error markers in the cells.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON, or has the wrong shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PersistError {
    /// Create a storage error with a custom message
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        PersistError::Storage(msg.into())
    }
}
