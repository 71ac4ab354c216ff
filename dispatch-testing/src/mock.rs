//! `MockProvider`: an in-memory `Provider` whose per-recipient outcome is
//! scriptable, used to drive end-to-end scenarios without a real SendGrid
//! account. Calls are journaled under a mutex against a fixed outcome table.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dispatch_provider::{Envelope, ErrorClass, Provider, Result, SendOutcome};

#[derive(Debug, Clone)]
enum Scripted {
    Ok,
    Fail(ErrorClass),
}

/// An in-memory [`Provider`] whose outcome per recipient address is
/// scriptable. Defaults to succeeding every send.
#[derive(Clone, Default)]
pub struct MockProvider {
    overrides: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<Envelope>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockProvider {
    /// A provider that succeeds for every recipient.
    pub fn always_ok() -> Self {
        Self::default()
    }

    /// Make every send to `email` fail as [`ErrorClass::Retryable`].
    pub fn fail_for(self, email: impl Into<String>) -> Self {
        self.fail_class(email, ErrorClass::Retryable)
    }

    /// Make every send to `email` fail with the given error class.
    pub fn fail_class(self, email: impl Into<String>, class: ErrorClass) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(email.into(), Scripted::Fail(class));
        self
    }

    /// Number of `send` calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All envelopes passed to `send`, in order.
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear the call journal without touching scripted overrides.
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn send(&self, envelope: &Envelope) -> Result<SendOutcome> {
        envelope.validate()?;
        self.calls.lock().unwrap().push(envelope.clone());

        let overrides = self.overrides.lock().unwrap();
        for addr in &envelope.to {
            if let Some(Scripted::Fail(class)) = overrides.get(addr.email()) {
                return Ok(SendOutcome::failed(mock_error_code(*class), *class));
            }
        }
        drop(overrides);

        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        Ok(SendOutcome::ok(format!("mock-{id}")))
    }
}

fn mock_error_code(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::Retryable => "mock_retryable",
        ErrorClass::Permanent => "mock_permanent",
        ErrorClass::RateLimited => "mock_rate_limited",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_provider::Address;

    fn envelope(to: &str) -> Envelope {
        Envelope {
            to: vec![Address::new(to).unwrap()],
            from: Address::new("campaigns@example.com").unwrap(),
            reply_to: None,
            subject: "hi".into(),
            html: "<p>hi</p>".into(),
            text: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn always_ok_succeeds_and_records_calls() {
        let provider = MockProvider::always_ok();
        let outcome = provider.send(&envelope("a@example.com")).await.unwrap();
        assert!(outcome.ok);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn fail_for_fails_only_the_scripted_recipient() {
        let provider = MockProvider::always_ok().fail_for("bad@example.com");

        let good = provider.send(&envelope("good@example.com")).await.unwrap();
        assert!(good.ok);

        let bad = provider.send(&envelope("bad@example.com")).await.unwrap();
        assert!(!bad.ok);
        assert_eq!(bad.error_class, Some(ErrorClass::Retryable));
    }

    #[tokio::test]
    async fn fail_class_sets_the_requested_error_class() {
        let provider =
            MockProvider::always_ok().fail_class("nope@example.com", ErrorClass::Permanent);
        let outcome = provider.send(&envelope("nope@example.com")).await.unwrap();
        assert_eq!(outcome.error_class, Some(ErrorClass::Permanent));
    }
}
