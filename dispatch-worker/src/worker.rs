//! The Worker (component C3): one concurrent unit that claims a batch, walks
//! its recipients against the Provider, and records outcomes. Each worker is
//! its own `tokio::spawn`ed task with a shared stop flag, polling and backing
//! off when the queue is empty, with heartbeats split onto their own ticking
//! task so a worker blocked in a slow Provider call still reports liveness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_db::entity::{batch, job, retry_task};
use dispatch_db::store::JobOutcome;
use dispatch_db::Store;
use dispatch_log::{error, info, warn};
use dispatch_metrics::DispatchMetrics;
use dispatch_provider::{Address, Envelope, ErrorClass, Provider};
use dispatch_ratelimit::RateLimiter;
use serde_json::Value as Json;
use tokio::sync::watch;
use uuid::Uuid;

use crate::template;

/// Default sleep when no batch is claimable. Not part of the external
/// configuration surface (see `spec.md` §4.3/§6 — `idleBackoff` is a
/// behavioral default, not a named config knob).
const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_secs(5);
/// Default sleep after a batch is released back to `pending` on rate-limit denial.
const DEFAULT_RATE_BACKOFF: Duration = Duration::from_secs(60);

/// Everything a [`Worker`] needs that isn't spec-tunable per §6.
pub struct WorkerConfig {
    pub heartbeat_interval: Duration,
    pub per_send_pacing: Duration,
    pub idle_backoff: Duration,
    pub rate_backoff: Duration,
    pub rate_limit_per_minute: u64,
    pub rate_limit_per_hour: u64,
    pub retry_base_delay_secs: u64,
    pub retry_multiplier: u32,
    pub retry_max_delay_secs: u64,
    pub retry_max_attempts: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            per_send_pacing: Duration::from_millis(100),
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            rate_backoff: DEFAULT_RATE_BACKOFF,
            rate_limit_per_minute: 100,
            rate_limit_per_hour: 1000,
            retry_base_delay_secs: 300,
            retry_multiplier: 3,
            retry_max_delay_secs: 7200,
            retry_max_attempts: 3,
        }
    }
}

/// A handle the Manager keeps per spawned Worker: its stop-signal sender and
/// the `JoinHandle` of its run loop, plus the heartbeat task's own handle, so
/// the Manager can own and stop many of these independently.
pub struct WorkerHandle {
    pub worker_id: Uuid,
    stop_tx: watch::Sender<bool>,
    pub join: tokio::task::JoinHandle<()>,
    pub heartbeat_join: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Request a graceful stop. The run loop finishes its current recipient,
    /// releases ownership of the rest of the batch, and exits.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Spawn one Worker: registers its row, starts the heartbeat task, then runs
/// the claim/process loop until stopped.
pub fn spawn(
    name: impl Into<String>,
    store: Store,
    provider: Arc<dyn Provider>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<DispatchMetrics>,
    config: WorkerConfig,
) -> WorkerHandle {
    let worker_id = Uuid::new_v4();
    let name = name.into();
    let (stop_tx, stop_rx) = watch::channel(false);

    let heartbeat_join = {
        let store = store.clone();
        let interval = config.heartbeat_interval;
        let mut stop_rx = stop_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = store.touch_heartbeat(worker_id).await {
                            warn!("worker {} heartbeat failed: {}", worker_id, e);
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
    };

    let join = tokio::spawn(run_loop(
        worker_id,
        name,
        store,
        provider,
        rate_limiter,
        metrics,
        config,
        stop_rx,
    ));

    WorkerHandle {
        worker_id,
        stop_tx,
        join,
        heartbeat_join,
    }
}

async fn run_loop(
    worker_id: Uuid,
    name: String,
    store: Store,
    provider: Arc<dyn Provider>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<DispatchMetrics>,
    config: WorkerConfig,
    mut stop_rx: watch::Receiver<bool>,
) {
    if let Err(e) = store
        .upsert_worker(
            worker_id,
            &name,
            config.rate_limit_per_minute as i32,
            config.rate_limit_per_hour as i32,
            Json::Object(Default::default()),
        )
        .await
    {
        error!("worker {} failed to register: {}", worker_id, e);
        return;
    }
    info!("worker {} ({}) starting", worker_id, name);

    let stopping = Arc::new(AtomicBool::new(false));
    {
        let stopping = stopping.clone();
        let mut stop_rx = stop_rx.clone();
        tokio::spawn(async move {
            if stop_rx.changed().await.is_ok() && *stop_rx.borrow() {
                stopping.store(true, Ordering::SeqCst);
            }
        });
    }

    while !stopping.load(Ordering::SeqCst) {
        match store.claim_next_batch(worker_id).await {
            Ok(Some((job_row, batch_row))) => {
                metrics.batches_claimed_total.inc();
                let _ = store.start_worker_batch(worker_id, job_row.id).await;

                process_batch(
                    worker_id,
                    &store,
                    provider.as_ref(),
                    &rate_limiter,
                    &metrics,
                    &config,
                    job_row,
                    batch_row,
                    &stopping,
                )
                .await;
            }
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(config.idle_backoff) => {}
                    _ = stop_rx.changed() => {}
                }
            }
            Err(e) => {
                error!("worker {} claim failed: {}", worker_id, e);
                tokio::time::sleep(config.idle_backoff).await;
            }
        }
    }

    let _ = store.set_worker_status(worker_id, dispatch_db::entity::worker::WorkerStatus::Offline).await;
    info!("worker {} stopped", worker_id);
}

#[allow(clippy::too_many_arguments)]
async fn process_batch(
    worker_id: Uuid,
    store: &Store,
    provider: &dyn Provider,
    rate_limiter: &RateLimiter,
    metrics: &DispatchMetrics,
    config: &WorkerConfig,
    job_row: job::Model,
    batch_row: batch::Model,
    stopping: &Arc<AtomicBool>,
) {
    let Some(recipients) = batch_row.recipients.as_array().cloned() else {
        let _ = store
            .update_batch_status(batch_row.id, batch::BatchStatus::Failed, 0, 0, Some("unreadable batch payload".into()))
            .await;
        let _ = store.finish_worker_batch(worker_id, 0, 0, true).await;
        return;
    };

    let template = job_row.payload.get("template").cloned().unwrap_or(Json::Null);
    let mut sent = 0i32;
    let mut failed = 0i32;

    for recipient in &recipients {
        if stopping.load(Ordering::SeqCst) {
            break;
        }

        let Some(recipient_id) = recipient_id(recipient) else {
            continue;
        };

        if let Ok(Some(existing)) = store.find_send_record(job_row.id, recipient_id).await {
            if existing.status.is_terminal() {
                continue;
            }
        }

        let check = match rate_limiter.check(worker_id, 1).await {
            Ok(c) => c,
            Err(e) => {
                warn!("worker {} rate limit check failed: {}", worker_id, e);
                break;
            }
        };
        if !check.allowed {
            let _ = store
                .update_batch_status(batch_row.id, batch::BatchStatus::Pending, sent, failed, None)
                .await;
            if sent + failed > 0 {
                let _ = store.update_job_counters(job_row.id, sent + failed, failed).await;
            }
            let _ = store.release_worker_batch(worker_id).await;
            tokio::time::sleep(config.rate_backoff).await;
            return;
        }

        let email = recipient.get("email").and_then(|v| v.as_str()).unwrap_or_default();
        let display_name = recipient.get("display_name").and_then(|v| v.as_str());

        let record = match store
            .create_send_record(job_row.tenant_id, job_row.campaign_id, job_row.id, recipient_id, email)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("worker {} failed to create send record: {}", worker_id, e);
                continue;
            }
        };

        let envelope = match build_envelope(&template, recipient, email, display_name) {
            Ok(e) => e,
            Err(err) => {
                let _ = store.mark_send_failed(record.id, &err).await;
                failed += 1;
                continue;
            }
        };

        let timer = std::time::Instant::now();
        let outcome = provider.send(&envelope).await;
        metrics.send_duration_seconds.observe(timer.elapsed().as_secs_f64());
        metrics.sends_total.inc();

        match outcome {
            Ok(result) if result.ok => {
                let _ = store.mark_send_sent(record.id, result.id).await;
                let _ = rate_limiter.record(worker_id, 1).await;
                sent += 1;
            }
            Ok(result) => {
                let message = result.error_code.unwrap_or_else(|| "send failed".into());
                let _ = store.mark_send_failed(record.id, &message).await;
                failed += 1;

                if matches!(result.error_class, Some(ErrorClass::Retryable) | Some(ErrorClass::RateLimited)) {
                    schedule_retry(store, config, job_row.id, record.id).await;
                }
            }
            Err(e) => {
                let _ = store.mark_send_failed(record.id, &e.to_string()).await;
                failed += 1;
                schedule_retry(store, config, job_row.id, record.id).await;
            }
        }

        tokio::time::sleep(config.per_send_pacing).await;
    }

    let batch_failed = failed > 0;
    let status = if batch_failed { batch::BatchStatus::Failed } else { batch::BatchStatus::Completed };
    let _ = store.update_batch_status(batch_row.id, status, sent, failed, None).await;
    let _ = store.update_job_counters(job_row.id, sent + failed, failed).await;
    let _ = store.finish_worker_batch(worker_id, sent, failed, batch_failed).await;

    if let Ok(remaining) = store.pending_batch_count_for_job(job_row.id).await {
        if remaining == 0 {
            let outcome = if job_row.failed_count + failed == 0 { JobOutcome::Completed } else { JobOutcome::Failed };
            let _ = store.finish_job(job_row.id, worker_id, outcome, None).await;
        }
    }
}

async fn schedule_retry(store: &Store, config: &WorkerConfig, job_id: Uuid, send_record_id: Uuid) {
    let delay = retry_task::Model::backoff_delay(1, config.retry_base_delay_secs, config.retry_multiplier, config.retry_max_delay_secs);
    let next_attempt_at = Utc::now() + delay;
    if let Err(e) = store
        .create_retry_task(job_id, send_record_id, config.retry_max_attempts, next_attempt_at)
        .await
    {
        warn!("failed to schedule retry for send_record {}: {}", send_record_id, e);
    }
}

fn recipient_id(recipient: &Json) -> Option<Uuid> {
    recipient.get("id").and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok())
}

fn build_envelope(template: &Json, recipient: &Json, email: &str, display_name: Option<&str>) -> Result<Envelope, String> {
    let vars = merge_vars(recipient);

    let subject = template.get("subject").and_then(|v| v.as_str()).unwrap_or_default();
    let html = template.get("html").and_then(|v| v.as_str()).unwrap_or_default();
    let text = template.get("text").and_then(|v| v.as_str());
    let from_email = template.get("from_email").and_then(|v| v.as_str()).unwrap_or_default();
    let from_name = template.get("from_name").and_then(|v| v.as_str());
    let tags: Vec<String> = template
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let to = match display_name {
        Some(name) => Address::with_name(email, name),
        None => Address::new(email),
    }
    .map_err(|e| e.to_string())?;

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

fn merge_vars(recipient: &Json) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    if let Some(name) = recipient.get("display_name").and_then(|v| v.as_str()) {
        vars.insert("name".to_string(), name.to_string());
    }
    if let Some(email) = recipient.get("email").and_then(|v| v.as_str()) {
        vars.insert("email".to_string(), email.to_string());
    }
    if let Some(custom) = recipient.get("custom_fields").and_then(|v| v.as_object()) {
        for (k, v) in custom {
            if let Some(s) = v.as_str() {
                vars.insert(k.clone(), s.to_string());
            }
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_db::entity::batch::Entity as BatchEntity;
    use dispatch_db::entity::job::Entity as JobEntity;
    use dispatch_testing::{test_store, MockProvider};
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter};
    use serde_json::json;

    fn recipient(id: Uuid, email: &str, name: &str) -> Json {
        json!({
            "id": id.to_string(),
            "email": email,
            "display_name": name,
            "custom_fields": {},
        })
    }

    fn template(subject: &str) -> Json {
        json!({
            "subject": subject,
            "html": "<p>Hi {{name}}</p>",
            "text": "Hi {{name}}",
            "from_email": "campaigns@example.com",
            "from_name": "Example Co",
            "tags": ["welcome"],
        })
    }

    async fn claim_for_test(store: &Store, job_id: Uuid) -> (job::Model, batch::Model) {
        let job_row = JobEntity::find_by_id(job_id).one(store.database().connection()).await.unwrap().unwrap();
        let batch_row = BatchEntity::find()
            .filter(dispatch_db::entity::batch::Column::JobId.eq(job_id))
            .one(store.database().connection())
            .await
            .unwrap()
            .unwrap();

        let mut active = batch_row.into_active_model();
        active.status = sea_orm::Set(batch::BatchStatus::Processing);
        let batch_row = active.update(store.database().connection()).await.unwrap();

        (job_row, batch_row)
    }

    #[tokio::test]
    async fn process_batch_marks_successful_sends() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok();
        let rate_limiter = Arc::new(RateLimiter::builder().per_minute(1000).per_hour(10000).build().unwrap());
        let metrics = Arc::new(DispatchMetrics::new().unwrap());
        let config = WorkerConfig::default();

        let recipient_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let job_id = store
            .create_job_with_batches(
                tenant_id,
                campaign_id,
                job::JobKind::Campaign,
                0,
                json!({"template": template("Welcome")}),
                vec![recipient(recipient_id, "a@example.com", "Alice")],
                10,
                3,
                None,
            )
            .await
            .unwrap();

        let (job_row, batch_row) = claim_for_test(&store, job_id).await;
        let stopping = Arc::new(AtomicBool::new(false));

        process_batch(
            Uuid::new_v4(),
            &store,
            &provider,
            &rate_limiter,
            &metrics,
            &config,
            job_row.clone(),
            batch_row,
            &stopping,
        )
        .await;

        assert_eq!(provider.call_count(), 1);
        let record = store.find_send_record(job_id, recipient_id).await.unwrap().unwrap();
        assert_eq!(record.status, dispatch_db::entity::send_record::SendStatus::Sent);
    }

    #[tokio::test]
    async fn process_batch_schedules_retry_for_retryable_failure() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok().fail_for("bounce@example.com");
        let rate_limiter = Arc::new(RateLimiter::builder().per_minute(1000).per_hour(10000).build().unwrap());
        let metrics = Arc::new(DispatchMetrics::new().unwrap());
        let config = WorkerConfig::default();

        let recipient_id = Uuid::new_v4();
        let job_id = store
            .create_job_with_batches(
                Uuid::new_v4(),
                Uuid::new_v4(),
                job::JobKind::Transactional,
                0,
                json!({"template": template("Receipt")}),
                vec![recipient(recipient_id, "bounce@example.com", "Bob")],
                10,
                3,
                None,
            )
            .await
            .unwrap();

        let (job_row, batch_row) = claim_for_test(&store, job_id).await;
        let stopping = Arc::new(AtomicBool::new(false));

        process_batch(
            Uuid::new_v4(),
            &store,
            &provider,
            &rate_limiter,
            &metrics,
            &config,
            job_row,
            batch_row,
            &stopping,
        )
        .await;

        let record = store.find_send_record(job_id, recipient_id).await.unwrap().unwrap();
        assert_eq!(record.status, dispatch_db::entity::send_record::SendStatus::Failed);
    }

    #[tokio::test]
    async fn process_batch_skips_recipients_with_terminal_send_records() {
        let store = test_store().await.unwrap();
        let provider = MockProvider::always_ok();
        let rate_limiter = Arc::new(RateLimiter::builder().per_minute(1000).per_hour(10000).build().unwrap());
        let metrics = Arc::new(DispatchMetrics::new().unwrap());
        let config = WorkerConfig::default();

        let recipient_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let job_id = store
            .create_job_with_batches(
                tenant_id,
                campaign_id,
                job::JobKind::Campaign,
                0,
                json!({"template": template("Already sent")}),
                vec![recipient(recipient_id, "done@example.com", "Dana")],
                10,
                3,
                None,
            )
            .await
            .unwrap();

        store
            .create_send_record(tenant_id, campaign_id, job_id, recipient_id, "done@example.com")
            .await
            .unwrap();
        let existing = store.find_send_record(job_id, recipient_id).await.unwrap().unwrap();
        store.mark_send_sent(existing.id, Some("already-sent".into())).await.unwrap();

        let (job_row, batch_row) = claim_for_test(&store, job_id).await;
        let stopping = Arc::new(AtomicBool::new(false));

        process_batch(
            Uuid::new_v4(),
            &store,
            &provider,
            &rate_limiter,
            &metrics,
            &config,
            job_row,
            batch_row,
            &stopping,
        )
        .await;

        assert_eq!(provider.call_count(), 0);
    }
}
