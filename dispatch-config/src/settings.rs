//! Typed settings for the dispatch engine, loaded through [`ConfigManager`](crate::ConfigManager).

use crate::error::ConfigError;
use crate::validation::Validate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_min_workers() -> usize {
    2
}
fn default_max_workers() -> usize {
    10
}
fn default_manager_interval_secs() -> u64 {
    60
}
fn default_batch_size() -> usize {
    100
}
fn default_per_send_pacing_ms() -> u64 {
    100
}
fn default_provider_timeout_secs() -> u64 {
    30
}
fn default_rate_limit_per_minute() -> u64 {
    100
}
fn default_rate_limit_per_hour() -> u64 {
    1000
}
fn default_rate_limit_buffer_pct() -> f64 {
    0.10
}
fn default_heartbeat_interval_secs() -> u64 {
    30
}
fn default_staleness_timeout_secs() -> u64 {
    120
}
fn default_retry_check_interval_secs() -> u64 {
    60
}
fn default_retry_batch_size() -> usize {
    50
}
fn default_retry_base_delay_secs() -> u64 {
    300
}
fn default_retry_multiplier() -> u32 {
    3
}
fn default_retry_max_delay_secs() -> u64 {
    7200
}
fn default_retry_max_attempts() -> u32 {
    3
}
fn default_metrics_interval_secs() -> u64 {
    60
}
fn default_alerts_interval_secs() -> u64 {
    300
}
fn default_retention_days() -> u32 {
    30
}
fn default_database_url() -> String {
    "postgres://localhost/dispatch".to_string()
}
fn default_alerts_log_path() -> String {
    "dispatch-alerts.log".to_string()
}

/// Every tunable in the dispatch engine's configuration surface, with its
/// default. Deserializable from env vars, `.env`, or a JSON/TOML file via
/// [`ConfigManager`](crate::ConfigManager).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub database_url: String,

    /// SendGrid API key. `None` runs the engine against `NullProvider`
    /// (always-ok, no network calls) — the default for local runs and tests.
    pub provider_api_key: Option<String>,
    pub alerts_log_path: String,

    pub min_workers: usize,
    pub max_workers: usize,
    pub manager_interval_secs: u64,

    pub batch_size: usize,
    pub per_send_pacing_ms: u64,
    pub provider_timeout_secs: u64,

    pub rate_limit_per_minute: u64,
    pub rate_limit_per_hour: u64,
    pub rate_limit_buffer_pct: f64,

    pub heartbeat_interval_secs: u64,
    pub staleness_timeout_secs: u64,

    pub retry_check_interval_secs: u64,
    pub retry_batch_size: usize,
    pub retry_base_delay_secs: u64,
    pub retry_multiplier: u32,
    pub retry_max_delay_secs: u64,
    pub retry_max_attempts: u32,

    pub metrics_interval_secs: u64,
    pub alerts_interval_secs: u64,

    pub retention_days: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            provider_api_key: None,
            alerts_log_path: default_alerts_log_path(),
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            manager_interval_secs: default_manager_interval_secs(),
            batch_size: default_batch_size(),
            per_send_pacing_ms: default_per_send_pacing_ms(),
            provider_timeout_secs: default_provider_timeout_secs(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            rate_limit_per_hour: default_rate_limit_per_hour(),
            rate_limit_buffer_pct: default_rate_limit_buffer_pct(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            staleness_timeout_secs: default_staleness_timeout_secs(),
            retry_check_interval_secs: default_retry_check_interval_secs(),
            retry_batch_size: default_retry_batch_size(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_delay_secs: default_retry_max_delay_secs(),
            retry_max_attempts: default_retry_max_attempts(),
            metrics_interval_secs: default_metrics_interval_secs(),
            alerts_interval_secs: default_alerts_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl DispatchConfig {
    pub fn manager_interval(&self) -> Duration {
        Duration::from_secs(self.manager_interval_secs)
    }

    pub fn per_send_pacing(&self) -> Duration {
        Duration::from_millis(self.per_send_pacing_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn staleness_timeout(&self) -> Duration {
        Duration::from_secs(self.staleness_timeout_secs)
    }

    pub fn retry_check_interval(&self) -> Duration {
        Duration::from_secs(self.retry_check_interval_secs)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs)
    }

    pub fn alerts_interval(&self) -> Duration {
        Duration::from_secs(self.alerts_interval_secs)
    }

    /// Rate limit reduced by the configured buffer percentage, rounded down.
    pub fn effective_rate_limit(&self, raw_limit: u64) -> u64 {
        let reduced = raw_limit as f64 * (1.0 - self.rate_limit_buffer_pct);
        reduced.floor().max(0.0) as u64
    }
}

impl Validate for DispatchConfig {
    fn validate(&self) -> crate::Result<()> {
        if self.min_workers == 0 {
            return Err(ConfigError::ValidationError("min_workers must be at least 1".into()));
        }
        if self.max_workers < self.min_workers {
            return Err(ConfigError::ValidationError("max_workers must be >= min_workers".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError("batch_size must be at least 1".into()));
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::ValidationError("retry_max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_design() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.min_workers, 2);
        assert_eq!(cfg.max_workers, 10);
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.rate_limit_per_minute, 100);
        assert_eq!(cfg.rate_limit_per_hour, 1000);
        assert_eq!(cfg.retry_base_delay_secs, 300);
        assert_eq!(cfg.retry_multiplier, 3);
        assert_eq!(cfg.retry_max_delay_secs, 7200);
        assert_eq!(cfg.retry_max_attempts, 3);
        assert_eq!(cfg.retention_days, 30);
    }

    #[test]
    fn effective_rate_limit_applies_buffer() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.effective_rate_limit(100), 90);
    }
}
