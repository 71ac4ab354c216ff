//! # dispatch-ratelimit
//!
//! The Rate Limiter (component C5): minute/hour windowed send counters with
//! a safety buffer, checked before a Worker attempts a send and recorded
//! after.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatch_ratelimit::{RateLimiter, RateLimitConfig};
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiter::builder()
//!     .per_minute(100)
//!     .per_hour(1000)
//!     .buffer_pct(0.10)
//!     .build()?;
//!
//! let worker = Uuid::new_v4();
//! let result = limiter.check(worker, 1).await?;
//! if result.allowed {
//!     limiter.record(worker, 1).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod windowed;

pub use config::{RateLimitConfig, RateLimiterBuilder};
pub use error::{RateLimitError, RateLimitResult};
pub use memory::MemoryStore;
pub use windowed::{effective_limit, RateLimitStore, Window};

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitCheckResult {
    pub allowed: bool,
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: u64,
    pub retry_after: Option<Duration>,
}

impl RateLimitCheckResult {
    pub fn allowed(remaining: u64, limit: u64, reset_at: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            limit,
            reset_at,
            retry_after: None,
        }
    }

    pub fn denied(limit: u64, reset_at: u64, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            limit,
            reset_at,
            retry_after: Some(retry_after),
        }
    }
}

/// The rate limiter: checks both the minute and hour window before allowing
/// a send, applying `buffer_pct` to each configured ceiling.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }

    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        dispatch_log::debug!(per_minute = config.per_minute, per_hour = config.per_hour, "rate limiter created");
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Would sending `n` more emails stay within both windows?
    pub async fn check(&self, worker_id: Uuid, n: u64) -> RateLimitResult<RateLimitCheckResult> {
        let minute_limit = effective_limit(self.config.per_minute, self.config.buffer_pct);
        let hour_limit = effective_limit(self.config.per_hour, self.config.buffer_pct);

        let minute_ok = self
            .store
            .allowed(worker_id, Window::Minute, minute_limit, n)
            .await
            .or_else(|e| if self.config.skip_on_error { Ok(true) } else { Err(e) })?;
        let hour_ok = self
            .store
            .allowed(worker_id, Window::Hour, hour_limit, n)
            .await
            .or_else(|e| if self.config.skip_on_error { Ok(true) } else { Err(e) })?;

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        if minute_ok && hour_ok {
            Ok(RateLimitCheckResult::allowed(minute_limit, minute_limit, now + 60))
        } else {
            let retry_after = if !minute_ok { Duration::from_secs(60) } else { Duration::from_secs(3600) };
            Ok(RateLimitCheckResult::denied(
                if minute_ok { hour_limit } else { minute_limit },
                now + retry_after.as_secs(),
                retry_after,
            ))
        }
    }

    /// Record `n` sends against both windows.
    pub async fn record(&self, worker_id: Uuid, n: u64) -> RateLimitResult<()> {
        self.store.record(worker_id, Window::Minute, n).await?;
        self.store.record(worker_id, Window::Hour, n).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn denies_once_the_minute_window_is_exhausted() {
        let limiter = RateLimiter::builder().per_minute(5).per_hour(1000).buffer_pct(0.0).build().unwrap();
        let worker = Uuid::new_v4();

        for _ in 0..5 {
            let result = limiter.check(worker, 1).await.unwrap();
            assert!(result.allowed);
            limiter.record(worker, 1).await.unwrap();
        }

        let result = limiter.check(worker, 1).await.unwrap();
        assert!(!result.allowed);
    }

    #[tokio::test]
    async fn buffer_tightens_the_effective_ceiling() {
        let limiter = RateLimiter::builder().per_minute(10).per_hour(1000).buffer_pct(0.5).build().unwrap();
        let worker = Uuid::new_v4();

        for _ in 0..5 {
            limiter.record(worker, 1).await.unwrap();
        }

        let result = limiter.check(worker, 1).await.unwrap();
        assert!(!result.allowed);
    }
}
