//! `JobSpec`: the caller-facing request to dispatch a campaign, validated
//! and split into batches by [`crate::queue::JobQueue`].

use dispatch_db::entity::job::JobKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// Default priority assigned to a job that does not specify one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// Default batch size: bounds latency to first partial result and
/// rate-limit granularity, not correctness.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default max retry attempts per recipient send.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// A single recipient, as handed to the Job Queue. Frozen into the owning
/// Batch's `recipients` column once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub custom_fields: serde_json::Map<String, Json>,
}

/// Sender identity and message content shared by every recipient in a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub from_email: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The caller's request to dispatch a campaign to a set of recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub tenant_id: Uuid,
    pub campaign_id: Uuid,
    pub kind: JobKind,
    pub template: JobTemplate,
    pub recipients: Vec<Recipient>,
    pub priority: i32,
    pub batch_size: usize,
    pub max_retries: i32,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl JobSpec {
    /// Build a job spec with the engine's defaults for priority, batch size
    /// and retry count.
    pub fn new(
        tenant_id: Uuid,
        campaign_id: Uuid,
        kind: JobKind,
        template: JobTemplate,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            tenant_id,
            campaign_id,
            kind,
            template,
            recipients,
            priority: DEFAULT_PRIORITY,
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            scheduled_at: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn schedule_at(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Validate this submission. Checked before any write: non-empty
    /// recipient list, a present template subject and body, and a present
    /// sender.
    pub fn validate(&self) -> Result<(), crate::error::QueueError> {
        use crate::error::QueueError;

        if self.recipients.is_empty() {
            return Err(QueueError::Validation("recipient list is empty".into()));
        }
        if self.template.subject.trim().is_empty() {
            return Err(QueueError::Validation("template subject is empty".into()));
        }
        if self.template.html.trim().is_empty() {
            return Err(QueueError::Validation("template body is empty".into()));
        }
        if self.template.from_email.trim().is_empty() {
            return Err(QueueError::Validation("sender is missing".into()));
        }
        if self.batch_size == 0 {
            return Err(QueueError::Validation("batch size must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of batches this spec will split into.
    pub fn batch_count(&self) -> usize {
        self.recipients.len().div_ceil(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> JobTemplate {
        JobTemplate {
            subject: "Hello".into(),
            html: "<p>hi</p>".into(),
            text: None,
            from_email: "sender@example.com".into(),
            from_name: None,
            reply_to: None,
            tags: vec![],
        }
    }

    fn recipient(n: usize) -> Recipient {
        Recipient {
            id: format!("r{n}"),
            email: format!("r{n}@example.com"),
            display_name: None,
            custom_fields: Default::default(),
        }
    }

    #[test]
    fn rejects_empty_recipients() {
        let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, template(), vec![]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn rejects_blank_subject() {
        let mut t = template();
        t.subject = "  ".into();
        let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, t, vec![recipient(1)]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn rejects_missing_sender() {
        let mut t = template();
        t.from_email = "".into();
        let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, t, vec![recipient(1)]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn accepts_a_well_formed_spec() {
        let spec = JobSpec::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            JobKind::Campaign,
            template(),
            vec![recipient(1), recipient(2)],
        );
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn batch_count_rounds_up() {
        let spec = JobSpec::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            JobKind::Campaign,
            template(),
            (0..250).map(recipient).collect(),
        )
        .with_batch_size(100);

        assert_eq!(spec.batch_count(), 3);
    }

    #[test]
    fn default_batch_size_is_one_hundred() {
        let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, template(), vec![recipient(1)]);
        assert_eq!(spec.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(spec.max_retries, DEFAULT_MAX_RETRIES);
    }
}
