//! Worker/Retry Controller error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store error: {0}")]
    Store(#[from] dispatch_db::DbError),

    #[error("provider error: {0}")]
    Provider(#[from] dispatch_provider::ProviderError),

    #[error("rate limiter error: {0}")]
    RateLimit(#[from] dispatch_ratelimit::RateLimitError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
