//! Error types for rate limiting.

use std::time::Duration;
use thiserror::Error;

/// Result type for rate limiting operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;

/// Rate limiting errors.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    LimitExceeded {
        remaining: u64,
        limit: u64,
        reset_at: u64,
        retry_after: Duration,
    },

    /// Store error (the `rate_counter` table, in production).
    #[error("rate limit store error: {0}")]
    StoreError(String),

    /// Configuration error.
    #[error("rate limit configuration error: {0}")]
    ConfigError(String),
}

impl RateLimitError {
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn limit_exceeded(limit: u64, reset_at: u64, retry_after: Duration) -> Self {
        Self::LimitExceeded {
            remaining: 0,
            limit,
            reset_at,
            retry_after,
        }
    }

    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::LimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_exceeded_carries_retry_after() {
        let error = RateLimitError::limit_exceeded(100, 1_234_567_890, Duration::from_secs(30));
        assert!(error.is_limit_exceeded());
        assert_eq!(error.retry_after(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn store_error_is_not_limit_exceeded() {
        let error = RateLimitError::store("connection failed");
        assert!(!error.is_limit_exceeded());
        assert_eq!(error.retry_after(), None);
    }
}
