//! Alert structure raised by the Monitor's thresholds loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Alert severity. Ordered so a caller can filter "at least warning" etc.
/// Named `High` rather than `Error` to match the Monitor's own vocabulary
/// for a breached threshold (nothing here is a Rust error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    High,
    Critical,
}

/// An alert raised by the Monitor when one of its thresholds is breached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,

    /// Which threshold fired, e.g. `"pending_jobs_exceeded"`, `"worker_stale"`.
    pub kind: String,

    pub level: AlertLevel,

    /// Human-readable summary.
    pub message: String,

    /// The worker this alert concerns, if any.
    pub worker_id: Option<Uuid>,

    pub metadata: HashMap<String, serde_json::Value>,
}

impl Alert {
    pub fn new(kind: impl Into<String>, level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind: kind.into(),
            level,
            message: message.into(),
            worker_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn worker(mut self, worker_id: Uuid) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_carries_kind_and_level() {
        let alert = Alert::new("pending_jobs_exceeded", AlertLevel::Warning, "queue backing up");
        assert_eq!(alert.kind, "pending_jobs_exceeded");
        assert_eq!(alert.level, AlertLevel::Warning);
    }

    #[test]
    fn level_ordering_matches_severity() {
        assert!(AlertLevel::Info < AlertLevel::Warning);
        assert!(AlertLevel::Warning < AlertLevel::High);
        assert!(AlertLevel::High < AlertLevel::Critical);
    }

    #[test]
    fn alert_serializes_to_json() {
        let alert = Alert::new("worker_stale", AlertLevel::Critical, "worker offline");
        assert!(alert.to_json().is_ok());
    }
}
