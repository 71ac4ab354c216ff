//! Windowed-counter rate limiting: a minute window and an hour window,
//! each independently capped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RateLimitResult;

/// The two windows the engine tracks per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    Minute,
    Hour,
}

/// Storage for windowed counters. The only production implementation lives
/// in `dispatch-db`, backed by the `rate_counter` table; an in-memory
/// implementation backs tests.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Would adding `n` to the current window's count stay within `limit`?
    async fn allowed(&self, worker_id: Uuid, window: Window, limit: u64, n: u64) -> RateLimitResult<bool>;

    /// Record `n` sends against the current window.
    async fn record(&self, worker_id: Uuid, window: Window, n: u64) -> RateLimitResult<()>;
}

/// Applies a safety buffer to a raw limit: `rateLimitBuffer` shrinks the
/// effective ceiling so the worker never brushes the provider's real limit.
///
/// A raw limit of `0` is the boundary case meaning "never allow a send" and
/// is passed through as `0` rather than floored up to `1`.
pub fn effective_limit(raw_limit: u64, buffer_pct: f64) -> u64 {
    if raw_limit == 0 {
        return 0;
    }
    let reduced = (raw_limit as f64) * (1.0 - buffer_pct.clamp(0.0, 0.9));
    reduced.floor().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_shrinks_the_ceiling() {
        assert_eq!(effective_limit(100, 0.10), 90);
        assert_eq!(effective_limit(1000, 0.10), 900);
        assert_eq!(effective_limit(1, 0.5), 1);
    }

    #[test]
    fn zero_raw_limit_stays_zero() {
        assert_eq!(effective_limit(0, 0.10), 0);
    }
}
