//! The single external capability the dispatch engine depends on.

use async_trait::async_trait;

use crate::{Envelope, Result, SendOutcome};

/// Send one envelope. The return carries a structured outcome instead of
/// `()` so retryable/permanent/rate-limited failures are distinguishable
/// without downcasting an error.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<SendOutcome>;

    /// Check if the provider is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}
