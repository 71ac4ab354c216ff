//! Always-succeeds provider for tests and local runs without a real API key.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Envelope, Provider, Result, SendOutcome};

#[derive(Default)]
pub struct NullProvider {
    sent: AtomicU64,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Provider for NullProvider {
    async fn send(&self, envelope: &Envelope) -> Result<SendOutcome> {
        envelope.validate()?;
        let n = self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(SendOutcome::ok(format!("null-{n}")))
    }
}
