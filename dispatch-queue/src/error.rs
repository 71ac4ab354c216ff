//! Error types for job submission.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Job Queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The job spec failed validation before any write was attempted.
    #[error("invalid job spec: {0}")]
    Validation(String),

    /// The store rejected the write.
    #[error("store error: {0}")]
    Store(#[from] dispatch_db::DbError),
}
