//! Job Queue (component C2): creates jobs from `JobSpec`s, splitting
//! recipients into batches and writing job + batches atomically. There is
//! no in-memory queue and no `dequeue()` — the store is the queue, and
//! Workers pull from it directly via `Store::claim_next_batch`. This keeps
//! the queue's own responsibility down to submission and validation.

use dispatch_db::Store;
use dispatch_log::{debug, info};
use serde_json::json;
use uuid::Uuid;

use crate::error::QueueResult;
use crate::job::JobSpec;

/// Creates jobs from campaigns and hands them to the store. A thin façade:
/// all persistence lives in `Store`.
#[derive(Clone)]
pub struct JobQueue {
    store: Store,
}

impl JobQueue {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Validate `spec`, split its recipients into `batch_size`-sized
    /// batches, and write the job and its batches in one transaction.
    /// Returns the new job's id.
    pub async fn submit(&self, spec: JobSpec) -> QueueResult<Uuid> {
        spec.validate()?;

        debug!(
            tenant_id = %spec.tenant_id,
            campaign_id = %spec.campaign_id,
            recipients = spec.recipients.len(),
            batch_size = spec.batch_size,
            "submitting job"
        );

        let payload = json!({
            "template": spec.template,
            "tags": spec.template.tags,
        });

        let recipients: Vec<serde_json::Value> = spec
            .recipients
            .iter()
            .map(|r| serde_json::to_value(r).expect("Recipient always serializes"))
            .collect();

        let job_id = self
            .store
            .create_job_with_batches(
                spec.tenant_id,
                spec.campaign_id,
                spec.kind,
                spec.priority,
                payload,
                recipients,
                spec.batch_size,
                spec.max_retries,
                spec.scheduled_at,
            )
            .await?;

        info!(job_id = %job_id, "job submitted");
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobTemplate, Recipient};
    use dispatch_db::entity::job::JobKind;

    fn template() -> JobTemplate {
        JobTemplate {
            subject: "Hello".into(),
            html: "<p>hi</p>".into(),
            text: None,
            from_email: "sender@example.com".into(),
            from_name: None,
            reply_to: None,
            tags: vec!["welcome".into()],
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
    fn rejects_invalid_spec_before_touching_the_store() {
        let spec = JobSpec::new(Uuid::new_v4(), Uuid::new_v4(), JobKind::Campaign, template(), vec![]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn valid_spec_passes_validation() {
        let spec = JobSpec::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            JobKind::Campaign,
            template(),
            vec![recipient(1), recipient(2)],
        );
        assert!(spec.validate().is_ok());
    }
}
