//! The Retry Controller (component C4): a periodic loop that re-attempts
//! per-recipient sends with exponential backoff. Interval-driven with a
//! cooperative stop channel, firing a plain `tokio::time::interval` at
//! `retryCheckInterval` rather than a cron expression, since retries have
//! no calendar schedule.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_db::entity::{job, retry_task, send_record};
use dispatch_db::Store;
use dispatch_log::{error, info, warn};
use dispatch_provider::{Address, Envelope, Provider};
use tokio::sync::watch;

use crate::template;

/// Tunables for the Retry Controller, matching `spec.md` §4.4/§6.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub check_interval: Duration,
    pub batch_size: u64,
    pub base_delay_secs: u64,
    pub multiplier: u32,
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            batch_size: 50,
            base_delay_secs: 300,
            multiplier: 3,
            max_delay_secs: 7200,
        }
    }
}

/// Owns the tick loop. Constructed by the Manager alongside its Workers.
pub struct RetryController {
    store: Store,
    provider: Arc<dyn Provider>,
    config: RetryConfig,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl RetryController {
    pub fn new(store: Store, provider: Arc<dyn Provider>, config: RetryConfig) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self { store, provider, config, stop_tx, stop_rx }
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// A sender the Manager can hold onto after `spawn` consumes `self`, so
    /// it can still signal the loop to stop.
    pub fn stop_handle(&self) -> watch::Sender<bool> {
        self.stop_tx.clone()
    }

    /// Spawn the tick loop as its own task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let mut stop_rx = self.stop_rx.clone();
        let store = self.store.clone();
        let provider = self.provider.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.check_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = run_once(&store, provider.as_ref(), &config).await {
                            error!("retry controller tick failed: {}", e);
                        }
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

async fn run_once(store: &Store, provider: &dyn Provider, config: &RetryConfig) -> dispatch_db::DbResult<()> {
    let now = Utc::now();
    let due = store.due_retry_tasks(now, config.batch_size).await?;

    for task in due {
        if let Err(e) = process_task(store, provider, config, task).await {
            warn!("retry task failed to process: {}", e);
        }
    }

    Ok(())
}

async fn process_task(
    store: &Store,
    provider: &dyn Provider,
    config: &RetryConfig,
    task: retry_task::Model,
) -> dispatch_db::DbResult<()> {
    let task = store.mark_retry_processing(task.id).await?;

    let Some(record) = find_send_record_by_id(store, task.send_record_id).await? else {
        return store.abandon_retry_task(task.id, "send record no longer exists").await;
    };
    let Some(job) = job_by_id(store, task.original_job_id).await? else {
        return store.abandon_retry_task(task.id, "original job no longer exists").await;
    };

    let envelope = match build_retry_envelope(&job, &record, task.attempt + 1) {
        Ok(e) => e,
        Err(msg) => return store.abandon_retry_task(task.id, &msg).await,
    };

    match provider.send(&envelope).await {
        Ok(outcome) if outcome.ok => {
            store.mark_send_sent(record.id, outcome.id).await?;
            store.complete_retry_task(task.id).await?;
            info!("retry succeeded for send_record {}", record.id);
        }
        Ok(outcome) => {
            let message = outcome.error_code.unwrap_or_else(|| "retry failed".into());
            finish_failed_attempt(store, config, &task, &record, &message).await?;
        }
        Err(e) => {
            finish_failed_attempt(store, config, &task, &record, &e.to_string()).await?;
        }
    }

    Ok(())
}

async fn finish_failed_attempt(
    store: &Store,
    config: &RetryConfig,
    task: &retry_task::Model,
    record: &send_record::Model,
    message: &str,
) -> dispatch_db::DbResult<()> {
    let next_attempt = task.attempt + 1;
    if next_attempt >= task.max_attempts {
        store.abandon_retry_task(task.id, message).await?;
        store.mark_send_failed(record.id, message).await?;
    } else {
        let delay = retry_task::Model::backoff_delay(next_attempt, config.base_delay_secs, config.multiplier, config.max_delay_secs);
        store.reschedule_retry_task(task.id, Utc::now() + delay, message).await?;
    }
    Ok(())
}

async fn find_send_record_by_id(store: &Store, id: uuid::Uuid) -> dispatch_db::DbResult<Option<send_record::Model>> {
    use sea_orm::EntityTrait;
    Ok(send_record::Entity::find_by_id(id).one(store.database().connection()).await?)
}

async fn job_by_id(store: &Store, id: uuid::Uuid) -> dispatch_db::DbResult<Option<job::Model>> {
    use sea_orm::EntityTrait;
    Ok(job::Entity::find_by_id(id).one(store.database().connection()).await?)
}

fn build_retry_envelope(job: &job::Model, record: &send_record::Model, attempt: i32) -> Result<Envelope, String> {
    let template = job.payload.get("template").cloned().unwrap_or(serde_json::Value::Null);

    let subject = template.get("subject").and_then(|v| v.as_str()).unwrap_or_default();
    let html = template.get("html").and_then(|v| v.as_str()).unwrap_or_default();
    let text = template.get("text").and_then(|v| v.as_str());
    let from_email = template.get("from_email").and_then(|v| v.as_str()).unwrap_or_default();
    let from_name = template.get("from_name").and_then(|v| v.as_str());
    let mut tags: Vec<String> = template
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    tags.push(format!("retry_attempt={attempt}"));

    let vars: HashMap<String, String> = [("email".to_string(), record.email.clone())].into_iter().collect();

    let to = Address::new(&record.email).map_err(|e| e.to_string())?;
    let from = match from_name {
        Some(name) => Address::with_name(from_email, name),
        None => Address::new(from_email),
    }
    .map_err(|e| e.to_string())?;

    Ok(Envelope {
        to: vec![to],
        from,
        reply_to: None,
        subject: template::expand(subject, &vars),
        html: template::expand(html, &vars),
        text: text.map(|t| template::expand(t, &vars)),
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_testing::{test_store, MockProvider};
    use serde_json::json;

    async fn seed(store: &Store, email: &str) -> (uuid::Uuid, uuid::Uuid) {
        let job_id = store
            .create_job_with_batches(
                uuid::Uuid::new_v4(),
                uuid::Uuid::new_v4(),
                job::JobKind::Campaign,
                0,
                json!({"template": {
                    "subject": "Receipt",
                    "html": "<p>Hi {{email}}</p>",
                    "text": "Hi {{email}}",
                    "from_email": "campaigns@example.com",
                    "from_name": "Example Co",
                    "tags": ["receipt"],
                }}),
                vec![json!({"id": uuid::Uuid::new_v4().to_string(), "email": email})],
                10,
                3,
                None,
            )
            .await
            .unwrap();

        let record = store
            .create_send_record(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), job_id, uuid::Uuid::new_v4(), email)
            .await
            .unwrap();
        store.mark_send_failed(record.id, "initial failure").await.unwrap();

        (job_id, record.id)
    }

    #[tokio::test]
    async fn retry_success_completes_the_task_and_marks_the_send_sent() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok();
        let config = RetryConfig::default();

        let (job_id, record_id) = seed(&store, "retry-ok@example.com").await;
        let task = store.create_retry_task(job_id, record_id, 3, Utc::now()).await.unwrap();

        process_task(&store, &provider, &config, task).await.unwrap();

        let record = find_send_record_by_id(&store, record_id).await.unwrap().unwrap();
        assert_eq!(record.status, send_record::SendStatus::Sent);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn retry_failure_below_max_attempts_reschedules_with_backoff() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok().fail_for("retry-fail@example.com");
        let config = RetryConfig::default();

        let (job_id, record_id) = seed(&store, "retry-fail@example.com").await;
        let task = store.create_retry_task(job_id, record_id, 3, Utc::now()).await.unwrap();

        process_task(&store, &provider, &config, task).await.unwrap();

        let updated = store.due_retry_tasks(Utc::now() + chrono::Duration::seconds(400), 10).await.unwrap();
        let rescheduled = updated.into_iter().find(|t| t.send_record_id == record_id).unwrap();
        assert_eq!(rescheduled.status, retry_task::RetryStatus::Pending);
        assert_eq!(rescheduled.attempt, 1);
    }

    #[tokio::test]
    async fn retry_failure_at_max_attempts_abandons_the_task() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok().fail_for("retry-abandon@example.com");
        let config = RetryConfig::default();

        let (job_id, record_id) = seed(&store, "retry-abandon@example.com").await;
        let task = store.create_retry_task(job_id, record_id, 1, Utc::now()).await.unwrap();

        process_task(&store, &provider, &config, task).await.unwrap();

        let record = find_send_record_by_id(&store, record_id).await.unwrap().unwrap();
        assert_eq!(record.status, send_record::SendStatus::Failed);
    }
}
