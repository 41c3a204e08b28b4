//! Snapshot error types.

use thiserror::Error;

/// Errors raised while persisting, loading or verifying snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem failure reading or writing a snapshot file.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted snapshot could not be decoded (or a snapshot could not be encoded).
    #[error("invalid snapshot data for '{name}': {message}")]
    InvalidData { name: String, message: String },

    /// No snapshot has been saved under the name.
    #[error("snapshot not found: {name}")]
    NotFound { name: String },

    /// The current capture differs from the saved one.
    #[error("snapshot '{name}' does not match:\n{report}")]
    Mismatch { name: String, report: String },
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
