//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while dispatching through a [`crate::Provider`].
///
/// These are transport-level failures — the provider could not be asked to
/// send at all. A provider that *was* asked and refused or deferred the send
/// reports that through [`crate::SendOutcome`] instead, never through this
/// type.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Invalid email address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Missing required envelope field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error reaching the provider.
    #[error("network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}
