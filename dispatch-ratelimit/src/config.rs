//! Rate limiter configuration and builder.

use crate::error::RateLimitResult;
use crate::memory::MemoryStore;
use crate::{RateLimitStore, RateLimiter};
use std::sync::Arc;

/// Configuration for a [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sends/minute ceiling before the buffer is applied.
    pub per_minute: u64,
    /// Sends/hour ceiling before the buffer is applied.
    pub per_hour: u64,
    /// Fraction shaved off both ceilings, e.g. `0.10` for a 10% buffer.
    pub buffer_pct: f64,
    /// Treat store errors as "allowed" rather than failing closed.
    pub skip_on_error: bool,
    /// Worker ids that bypass the limiter entirely (used in tests).
    pub bypass_keys: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 100,
            per_hour: 1000,
            buffer_pct: 0.10,
            skip_on_error: true,
            bypass_keys: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }

    pub fn should_bypass(&self, key: &str) -> bool {
        self.bypass_keys.iter().any(|k| k == key)
    }
}

/// Builder for a [`RateLimiter`].
pub struct RateLimiterBuilder {
    per_minute: u64,
    per_hour: u64,
    buffer_pct: f64,
    skip_on_error: bool,
    bypass_keys: Vec<String>,
    store: Option<Arc<dyn RateLimitStore>>,
}

impl RateLimiterBuilder {
    pub fn new() -> Self {
        Self {
            per_minute: 100,
            per_hour: 1000,
            buffer_pct: 0.10,
            skip_on_error: true,
            bypass_keys: Vec::new(),
            store: None,
        }
    }

    pub fn per_minute(mut self, limit: u64) -> Self {
        self.per_minute = limit;
        self
    }

    pub fn per_hour(mut self, limit: u64) -> Self {
        self.per_hour = limit;
        self
    }

    pub fn buffer_pct(mut self, buffer_pct: f64) -> Self {
        self.buffer_pct = buffer_pct;
        self
    }

    pub fn skip_on_error(mut self, skip: bool) -> Self {
        self.skip_on_error = skip;
        self
    }

    pub fn bypass_key(mut self, key: impl Into<String>) -> Self {
        self.bypass_keys.push(key.into());
        self
    }

    /// Use a production store (e.g. `dispatch_db::Store`). Defaults to an
    /// in-memory store when omitted.
    pub fn store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// `per_minute`/`per_hour` of `0` is accepted: [`effective_limit`](crate::effective_limit)
    /// passes a raw `0` through unchanged, so the built limiter always denies
    /// and every batch is released back to the queue rather than sent.
    pub fn build(self) -> RateLimitResult<RateLimiter> {
        let config = RateLimitConfig {
            per_minute: self.per_minute,
            per_hour: self.per_hour,
            buffer_pct: self.buffer_pct,
            skip_on_error: self.skip_on_error,
            bypass_keys: self.bypass_keys,
        };

        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        Ok(RateLimiter::new(store, config))
    }
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_component_design() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_minute, 100);
        assert_eq!(config.per_hour, 1000);
        assert_eq!(config.buffer_pct, 0.10);
    }

    #[test]
    fn bypass_keys_are_checked_by_value() {
        let config = RateLimitConfig {
            bypass_keys: vec!["admin".to_string()],
            ..Default::default()
        };
        assert!(config.should_bypass("admin"));
        assert!(!config.should_bypass("user"));
    }

    #[tokio::test]
    async fn zero_limits_build_a_limiter_that_always_denies() {
        let limiter = RateLimiterBuilder::new().per_minute(0).per_hour(1000).build().unwrap();
        let result = limiter.check(uuid::Uuid::new_v4(), 1).await.unwrap();
        assert!(!result.allowed);
    }
}
