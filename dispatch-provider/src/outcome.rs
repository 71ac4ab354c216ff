//! The Provider capability's single output type.

use serde::{Deserialize, Serialize};

/// How a failed send should be treated by the Retry Controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Worth a bounded retry with backoff (5xx, connection reset, timeout).
    Retryable,
    /// Will never succeed (bad address, rejected content) — no retry.
    Permanent,
    /// Provider pushed back; retry only after its cooldown elapses.
    RateLimited,
}

/// Result of a single [`crate::Provider::send`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    pub ok: bool,
    pub id: Option<String>,
    pub error_code: Option<String>,
    pub error_class: Option<ErrorClass>,
}

impl SendOutcome {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id.into()),
            error_code: None,
            error_class: None,
        }
    }

    pub fn failed(error_code: impl Into<String>, error_class: ErrorClass) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: Some(error_code.into()),
            error_class: Some(error_class),
        }
    }
}
