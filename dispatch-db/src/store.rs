//! Store Gateway (component C1): the only shared mutable resource in the
//! system. Every cross-worker coordination point — claiming a batch,
//! incrementing a counter, finishing a job — goes through one of these
//! methods as a single transaction.

use crate::entity::{batch, job, metrics_sample, rate_counter, retry_task, send_record, worker};
use crate::{DbError, DbResult, IsolationLevel, TransactionExt};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::Database;

/// Thin façade over the persistent store. Owned by a Worker, the Retry
/// Controller and the Monitor alike — none of them hold any other shared
/// mutable state.
#[derive(Clone)]
pub struct Store {
    db: Database,
}

/// Outcome passed to [`Store::finish_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create a Job and its Batches atomically. `recipients` is already
    /// validated non-empty by the caller (Job Queue); this method only
    /// splits it into `batch_size`-sized slices and writes both rows in one
    /// transaction so a Job is never observed without its Batches.
    pub async fn create_job_with_batches(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
        kind: job::JobKind,
        priority: i32,
        payload: Json,
        recipients: Vec<Json>,
        batch_size: usize,
        max_retries: i32,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> DbResult<Uuid> {
        let job_id = Uuid::new_v4();
        let now = Utc::now();
        let total_recipients = recipients.len() as i32;

        let txn = self.db.begin_transaction().await?;

        let job_model = job::ActiveModel {
            id: Set(job_id),
            tenant_id: Set(tenant_id),
            campaign_id: Set(campaign_id),
            priority: Set(priority),
            status: Set(job::JobStatus::Pending),
            kind: Set(kind),
            payload: Set(payload),
            batch_size: Set(batch_size as i32),
            total_recipients: Set(total_recipients),
            processed_count: Set(0),
            failed_count: Set(0),
            retry_count: Set(0),
            max_retries: Set(max_retries),
            scheduled_at: Set(scheduled_at),
            started_at: Set(None),
            completed_at: Set(None),
            failed_at: Set(None),
            error_message: Set(None),
            owner_worker_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        job_model.insert(&txn).await?;

        for (idx, chunk) in recipients.chunks(batch_size.max(1)).enumerate() {
            let batch_model = batch::ActiveModel {
                id: Set(Uuid::new_v4()),
                job_id: Set(job_id),
                index: Set(idx as i32 + 1),
                recipients: Set(Json::Array(chunk.to_vec())),
                status: Set(batch::BatchStatus::Pending),
                started_at: Set(None),
                completed_at: Set(None),
                sent: Set(0),
                failed: Set(0),
                error_message: Set(None),
            };
            batch_model.insert(&txn).await?;
        }

        txn.commit().await.map_err(|e| DbError::Transaction(e.to_string()))?;
        Ok(job_id)
    }

    /// Select the highest-priority claimable batch and atomically take
    /// ownership of it and its Job.
    ///
    /// Ordering: `(job.priority desc, job.scheduled_at asc nulls first,
    /// batch.index asc)`, tie-broken by `job.created_at asc, batch.id`.
    /// Uses `SELECT ... FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// block each other on the same candidate set.
    pub async fn claim_next_batch(
        &self,
        worker_id: Uuid,
    ) -> DbResult<Option<(job::Model, batch::Model)>> {
        let txn = self
            .db
            .begin_transaction_with_isolation(IsolationLevel::ReadCommitted)
            .await?;

        #[derive(Debug, FromQueryResult)]
        struct Candidate {
            batch_id: Uuid,
        }

        let backend = txn.get_database_backend();
        let sql = r#"
            SELECT b.id AS batch_id
            FROM batch b
            JOIN job j ON j.id = b.job_id
            WHERE b.status = 'pending'
              AND j.status IN ('pending', 'processing')
              AND (j.owner_worker_id IS NULL OR j.owner_worker_id = $1)
              AND (j.scheduled_at IS NULL OR j.scheduled_at <= now())
            ORDER BY j.priority DESC, j.scheduled_at ASC NULLS FIRST, b.index ASC,
                     j.created_at ASC, b.id ASC
            LIMIT 1
            FOR UPDATE OF b SKIP LOCKED
        "#;

        let candidate = Candidate::find_by_statement(Statement::from_sql_and_values(
            backend,
            sql,
            [worker_id.into()],
        ))
        .one(&txn)
        .await?;

        let Some(candidate) = candidate else {
            txn.commit().await.map_err(|e| DbError::Transaction(e.to_string()))?;
            return Ok(None);
        };

        let batch_row = batch::Entity::find_by_id(candidate.batch_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("batch {}", candidate.batch_id)))?;

        let mut batch_active: batch::ActiveModel = batch_row.clone().into();
        batch_active.status = Set(batch::BatchStatus::Processing);
        batch_active.started_at = Set(Some(Utc::now()));
        let batch_row = batch_active.update(&txn).await?;

        let job_row = job::Entity::find_by_id(batch_row.job_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("job {}", batch_row.job_id)))?;

        let mut job_active: job::ActiveModel = job_row.clone().into();
        job_active.status = Set(job::JobStatus::Processing);
        job_active.owner_worker_id = Set(Some(worker_id));
        job_active.started_at = Set(Some(job_row.started_at.unwrap_or_else(Utc::now)));
        job_active.updated_at = Set(Utc::now());
        let job_row = job_active.update(&txn).await?;

        self.touch_heartbeat_in_txn(&txn, worker_id).await?;

        txn.commit().await.map_err(|e| DbError::Transaction(e.to_string()))?;
        Ok(Some((job_row, batch_row)))
    }

    pub async fn update_batch_status(
        &self,
        batch_id: Uuid,
        status: batch::BatchStatus,
        sent: i32,
        failed: i32,
        err: Option<String>,
    ) -> DbResult<()> {
        let conn = self.db.connection();
        let row = batch::Entity::find_by_id(batch_id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("batch {}", batch_id)))?;

        let mut active: batch::ActiveModel = row.into();
        active.status = Set(status);
        active.sent = Set(sent);
        active.failed = Set(failed);
        active.error_message = Set(err);
        if matches!(status, batch::BatchStatus::Completed | batch::BatchStatus::Failed) {
            active.completed_at = Set(Some(Utc::now()));
        }
        active.update(conn).await?;
        Ok(())
    }

    /// Atomic counter arithmetic — never a read/modify/write round trip.
    pub async fn update_job_counters(
        &self,
        job_id: Uuid,
        processed_delta: i32,
        failed_delta: i32,
    ) -> DbResult<()> {
        let conn = self.db.connection();
        let stmt = Statement::from_sql_and_values(
            conn.get_database_backend(),
            r#"UPDATE job
               SET processed_count = processed_count + $1,
                   failed_count = failed_count + $2,
                   updated_at = now()
               WHERE id = $3"#,
            [processed_delta.into(), failed_delta.into(), job_id.into()],
        );
        conn.execute(stmt).await?;
        Ok(())
    }

    /// Guarded by `owner_worker_id == worker_id`.
    pub async fn finish_job(
        &self,
        job_id: Uuid,
        worker_id: Uuid,
        outcome: JobOutcome,
        err: Option<String>,
    ) -> DbResult<()> {
        let conn = self.db.connection();
        let row = job::Entity::find_by_id(job_id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("job {}", job_id)))?;

        if row.owner_worker_id != Some(worker_id) {
            return Err(DbError::Validation(format!(
                "job {} is not owned by worker {}",
                job_id, worker_id
            )));
        }

        let mut active: job::ActiveModel = row.into();
        let now = Utc::now();
        match outcome {
            JobOutcome::Completed => {
                active.status = Set(job::JobStatus::Completed);
                active.completed_at = Set(Some(now));
            }
            JobOutcome::Failed => {
                active.status = Set(job::JobStatus::Failed);
                active.failed_at = Set(Some(now));
                active.error_message = Set(err);
            }
        }
        active.updated_at = Set(now);
        active.update(conn).await?;
        Ok(())
    }

    /// Any Job still `processing` whose owning worker's heartbeat is older
    /// than `staleness` is returned to the pool, along with its batches.
    pub async fn reclaim_stale_jobs(
        &self,
        now: DateTime<Utc>,
        staleness: chrono::Duration,
    ) -> DbResult<u64> {
        let txn = self.db.begin_transaction().await?;
        let cutoff = now - staleness;

        let stale_workers = worker::Entity::find()
            .filter(worker::Column::LastHeartbeat.lt(cutoff))
            .all(&txn)
            .await?;

        let mut reclaimed = 0u64;
        for w in stale_workers {
            let stuck_jobs = job::Entity::find()
                .filter(job::Column::OwnerWorkerId.eq(w.id))
                .filter(job::Column::Status.eq(job::JobStatus::Processing))
                .all(&txn)
                .await?;

            for j in stuck_jobs {
                let job_id = j.id;
                let mut job_active: job::ActiveModel = j.into();
                job_active.status = Set(job::JobStatus::Pending);
                job_active.owner_worker_id = Set(None);
                job_active.updated_at = Set(now);
                job_active.update(&txn).await?;

                let stuck_batches = batch::Entity::find()
                    .filter(batch::Column::JobId.eq(job_id))
                    .filter(batch::Column::Status.eq(batch::BatchStatus::Processing))
                    .all(&txn)
                    .await?;
                for b in stuck_batches {
                    let mut batch_active: batch::ActiveModel = b.into();
                    batch_active.status = Set(batch::BatchStatus::Pending);
                    batch_active.started_at = Set(None);
                    batch_active.update(&txn).await?;
                    reclaimed += 1;
                }
            }
        }

        txn.commit().await.map_err(|e| DbError::Transaction(e.to_string()))?;
        Ok(reclaimed)
    }

    // -- Worker lifecycle -------------------------------------------------

    pub async fn upsert_worker(
        &self,
        worker_id: Uuid,
        name: &str,
        rate_limit_per_minute: i32,
        rate_limit_per_hour: i32,
        config: Json,
    ) -> DbResult<worker::Model> {
        let conn = self.db.connection();
        if let Some(existing) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let mut active: worker::ActiveModel = existing.into();
            active.status = Set(worker::WorkerStatus::Idle);
            active.last_heartbeat = Set(Utc::now());
            Ok(active.update(conn).await?)
        } else {
            let model = worker::ActiveModel {
                id: Set(worker_id),
                name: Set(name.to_string()),
                status: Set(worker::WorkerStatus::Idle),
                current_job_id: Set(None),
                max_concurrent_jobs: Set(1),
                rate_limit_per_minute: Set(rate_limit_per_minute),
                rate_limit_per_hour: Set(rate_limit_per_hour),
                last_heartbeat: Set(Utc::now()),
                last_job_started_at: Set(None),
                last_job_completed_at: Set(None),
                total_jobs_processed: Set(0),
                total_emails_sent: Set(0),
                total_errors: Set(0),
                consecutive_failures: Set(0),
                metrics: Set(Json::Object(Default::default())),
                config: Set(config),
            };
            Ok(model.insert(conn).await?)
        }
    }

    pub async fn touch_heartbeat(&self, worker_id: Uuid) -> DbResult<()> {
        let conn = self.db.connection();
        self.touch_heartbeat_in_txn(conn, worker_id).await
    }

    async fn touch_heartbeat_in_txn<C: ConnectionTrait>(
        &self,
        conn: &C,
        worker_id: Uuid,
    ) -> DbResult<()> {
        if let Some(row) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let mut active: worker::ActiveModel = row.into();
            active.last_heartbeat = Set(Utc::now());
            active.update(conn).await?;
        }
        Ok(())
    }

    pub async fn set_worker_status(&self, worker_id: Uuid, status: worker::WorkerStatus) -> DbResult<()> {
        let conn = self.db.connection();
        if let Some(row) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let mut active: worker::ActiveModel = row.into();
            active.status = Set(status);
            active.update(conn).await?;
        }
        Ok(())
    }

    /// Release a worker back to idle without touching its totals, e.g. when
    /// a batch is handed back to `pending` on a rate-limit denial rather
    /// than actually finishing.
    pub async fn release_worker_batch(&self, worker_id: Uuid) -> DbResult<()> {
        let conn = self.db.connection();
        if let Some(row) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let mut active: worker::ActiveModel = row.into();
            active.status = Set(worker::WorkerStatus::Idle);
            active.current_job_id = Set(None);
            active.update(conn).await?;
        }
        Ok(())
    }

    /// Mark a worker as having just started on `job_id`'s claimed batch.
    pub async fn start_worker_batch(&self, worker_id: Uuid, job_id: Uuid) -> DbResult<()> {
        let conn = self.db.connection();
        if let Some(row) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let mut active: worker::ActiveModel = row.into();
            active.status = Set(worker::WorkerStatus::Busy);
            active.current_job_id = Set(Some(job_id));
            active.last_job_started_at = Set(Some(Utc::now()));
            active.update(conn).await?;
        }
        Ok(())
    }

    /// Record the outcome of the batch a worker just finished: accumulate its
    /// totals, reset or bump `consecutive_failures`, and go back to idle.
    pub async fn finish_worker_batch(&self, worker_id: Uuid, sent: i32, failed: i32, batch_failed: bool) -> DbResult<()> {
        let conn = self.db.connection();
        if let Some(row) = worker::Entity::find_by_id(worker_id).one(conn).await? {
            let consecutive_failures = if batch_failed { row.consecutive_failures + 1 } else { 0 };
            let total_jobs_processed = row.total_jobs_processed + 1;
            let total_emails_sent = row.total_emails_sent + sent;
            let total_errors = row.total_errors + failed;

            let mut active: worker::ActiveModel = row.into();
            active.status = Set(worker::WorkerStatus::Idle);
            active.current_job_id = Set(None);
            active.last_job_completed_at = Set(Some(Utc::now()));
            active.total_jobs_processed = Set(total_jobs_processed);
            active.total_emails_sent = Set(total_emails_sent);
            active.total_errors = Set(total_errors);
            active.consecutive_failures = Set(consecutive_failures);
            active.update(conn).await?;
        }
        Ok(())
    }

    pub async fn list_workers(&self) -> DbResult<Vec<worker::Model>> {
        Ok(worker::Entity::find().all(self.db.connection()).await?)
    }

    // -- Send records -------------------------------------------------------

    /// Lazy creation: no row exists until the first attempt. Idempotence is
    /// guarded by the unique `(job_id, recipient_id)` index — callers should
    /// check [`Store::find_send_record`] before sending.
    pub async fn create_send_record(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
        job_id: Uuid,
        recipient_id: Uuid,
        email: &str,
    ) -> DbResult<send_record::Model> {
        let model = send_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            campaign_id: Set(campaign_id),
            job_id: Set(job_id),
            recipient_id: Set(recipient_id),
            email: Set(email.to_string()),
            status: Set(send_record::SendStatus::Queued),
            provider_message_id: Set(None),
            sent_at: Set(None),
            error_message: Set(None),
        };
        Ok(model.insert(self.db.connection()).await?)
    }

    pub async fn find_send_record(
        &self,
        job_id: Uuid,
        recipient_id: Uuid,
    ) -> DbResult<Option<send_record::Model>> {
        Ok(send_record::Entity::find()
            .filter(send_record::Column::JobId.eq(job_id))
            .filter(send_record::Column::RecipientId.eq(recipient_id))
            .one(self.db.connection())
            .await?)
    }

    pub async fn mark_send_sent(&self, id: Uuid, provider_message_id: Option<String>) -> DbResult<()> {
        let conn = self.db.connection();
        let row = send_record::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("send_record {}", id)))?;
        let mut active: send_record::ActiveModel = row.into();
        active.status = Set(send_record::SendStatus::Sent);
        active.provider_message_id = Set(provider_message_id);
        active.sent_at = Set(Some(Utc::now()));
        active.error_message = Set(None);
        active.update(conn).await?;
        Ok(())
    }

    pub async fn mark_send_failed(&self, id: Uuid, error_message: &str) -> DbResult<()> {
        let conn = self.db.connection();
        let row = send_record::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("send_record {}", id)))?;
        let mut active: send_record::ActiveModel = row.into();
        active.status = Set(send_record::SendStatus::Failed);
        active.error_message = Set(Some(error_message.to_string()));
        active.update(conn).await?;
        Ok(())
    }

    // -- Retry tasks ----------------------------------------------------

    pub async fn create_retry_task(
        &self,
        original_job_id: Uuid,
        send_record_id: Uuid,
        max_attempts: i32,
        next_attempt_at: DateTime<Utc>,
    ) -> DbResult<retry_task::Model> {
        let model = retry_task::ActiveModel {
            id: Set(Uuid::new_v4()),
            original_job_id: Set(original_job_id),
            send_record_id: Set(send_record_id),
            attempt: Set(0),
            max_attempts: Set(max_attempts),
            next_attempt_at: Set(next_attempt_at),
            status: Set(retry_task::RetryStatus::Pending),
            error_message: Set(None),
        };
        Ok(model.insert(self.db.connection()).await?)
    }

    pub async fn due_retry_tasks(&self, now: DateTime<Utc>, limit: u64) -> DbResult<Vec<retry_task::Model>> {
        Ok(retry_task::Entity::find()
            .filter(retry_task::Column::Status.eq(retry_task::RetryStatus::Pending))
            .filter(retry_task::Column::NextAttemptAt.lte(now))
            .order_by_asc(retry_task::Column::NextAttemptAt)
            .paginate(self.db.connection(), limit)
            .fetch_page(0)
            .await?)
    }

    pub async fn mark_retry_processing(&self, id: Uuid) -> DbResult<retry_task::Model> {
        let conn = self.db.connection();
        let row = retry_task::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("retry_task {}", id)))?;
        let mut active: retry_task::ActiveModel = row.into();
        active.status = Set(retry_task::RetryStatus::Processing);
        Ok(active.update(conn).await?)
    }

    pub async fn complete_retry_task(&self, id: Uuid) -> DbResult<()> {
        let conn = self.db.connection();
        let row = retry_task::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("retry_task {}", id)))?;
        let mut active: retry_task::ActiveModel = row.into();
        active.status = Set(retry_task::RetryStatus::Completed);
        active.update(conn).await?;
        Ok(())
    }

    pub async fn reschedule_retry_task(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
        error_message: &str,
    ) -> DbResult<()> {
        let conn = self.db.connection();
        let row = retry_task::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("retry_task {}", id)))?;
        let mut active: retry_task::ActiveModel = row.into();
        active.attempt = Set(row_attempt(&active) + 1);
        active.status = Set(retry_task::RetryStatus::Pending);
        active.next_attempt_at = Set(next_attempt_at);
        active.error_message = Set(Some(error_message.to_string()));
        active.update(conn).await?;
        Ok(())
    }

    pub async fn abandon_retry_task(&self, id: Uuid, error_message: &str) -> DbResult<()> {
        let conn = self.db.connection();
        let row = retry_task::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("retry_task {}", id)))?;
        let mut active: retry_task::ActiveModel = row.into();
        active.status = Set(retry_task::RetryStatus::Abandoned);
        active.error_message = Set(Some(error_message.to_string()));
        active.update(conn).await?;
        Ok(())
    }

    // -- Rate counters ----------------------------------------------------

    /// Advisory read: does `count + n` stay within `limit` for the active
    /// window? The actual increment happens in [`Store::record_send`].
    pub async fn allowed_send(
        &self,
        worker_id: Uuid,
        window: rate_counter::RateWindow,
        limit: u64,
        n: u64,
    ) -> DbResult<bool> {
        let window_start = window.floor(Utc::now());
        let current = rate_counter::Entity::find()
            .filter(rate_counter::Column::WorkerId.eq(worker_id))
            .filter(rate_counter::Column::Window.eq(window))
            .filter(rate_counter::Column::WindowStart.eq(window_start))
            .one(self.db.connection())
            .await?
            .map(|row| row.count as u64)
            .unwrap_or(0);
        Ok(current + n <= limit)
    }

    /// `INSERT ... ON CONFLICT (worker_id, window, window_start) DO UPDATE
    /// SET count = count + excluded.count`.
    pub async fn record_send(
        &self,
        worker_id: Uuid,
        window: rate_counter::RateWindow,
        n: u64,
    ) -> DbResult<()> {
        let conn = self.db.connection();
        let window_start = window.floor(Utc::now());
        let window_str = match window {
            rate_counter::RateWindow::Minute => "minute",
            rate_counter::RateWindow::Hour => "hour",
        };
        let stmt = Statement::from_sql_and_values(
            conn.get_database_backend(),
            r#"INSERT INTO rate_counter (id, worker_id, window, window_start, count)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (worker_id, window, window_start)
               DO UPDATE SET count = rate_counter.count + excluded.count"#,
            [
                Uuid::new_v4().into(),
                worker_id.into(),
                window_str.into(),
                window_start.into(),
                (n as i64).into(),
            ],
        );
        conn.execute(stmt).await?;
        Ok(())
    }

    // -- Metrics ----------------------------------------------------------

    pub async fn pending_batch_count(&self) -> DbResult<u64> {
        Ok(batch::Entity::find()
            .filter(batch::Column::Status.eq(batch::BatchStatus::Pending))
            .count(self.db.connection())
            .await?)
    }

    /// Remaining pending (not yet claimed or terminal) batches for one job,
    /// used to decide whether that job itself is done.
    pub async fn pending_batch_count_for_job(&self, job_id: Uuid) -> DbResult<u64> {
        Ok(batch::Entity::find()
            .filter(batch::Column::JobId.eq(job_id))
            .filter(batch::Column::Status.is_in([batch::BatchStatus::Pending, batch::BatchStatus::Processing]))
            .count(self.db.connection())
            .await?)
    }

    pub async fn processing_batch_count(&self) -> DbResult<u64> {
        Ok(batch::Entity::find()
            .filter(batch::Column::Status.eq(batch::BatchStatus::Processing))
            .count(self.db.connection())
            .await?)
    }

    pub async fn pending_job_count(&self) -> DbResult<u64> {
        Ok(job::Entity::find()
            .filter(job::Column::Status.eq(job::JobStatus::Pending))
            .count(self.db.connection())
            .await?)
    }

    /// Sent `SendRecord`s in the hour preceding `now`, for the Monitor's
    /// throughput aggregate.
    pub async fn sends_in_last_hour(&self, now: DateTime<Utc>) -> DbResult<u64> {
        Ok(send_record::Entity::find()
            .filter(send_record::Column::Status.eq(send_record::SendStatus::Sent))
            .filter(send_record::Column::SentAt.gte(now - chrono::Duration::hours(1)))
            .count(self.db.connection())
            .await?)
    }

    /// Count of `SendRecord`s currently terminally `failed`. `SendRecord`
    /// carries no failure timestamp (only `sentAt`, set on success), so this
    /// is a point-in-time count rather than an hour-windowed one; good
    /// enough for the Monitor's success-rate estimate alongside
    /// [`Store::sends_in_last_hour`].
    pub async fn failed_send_count(&self) -> DbResult<u64> {
        Ok(send_record::Entity::find()
            .filter(send_record::Column::Status.eq(send_record::SendStatus::Failed))
            .count(self.db.connection())
            .await?)
    }

    /// Persist one aggregate row. The Monitor calls this once per metrics
    /// tick, keyed to the rounded hour.
    pub async fn record_metrics_sample(
        &self,
        worker_id: Option<Uuid>,
        sampled_at: DateTime<Utc>,
        throughput_per_hour: f64,
        success_rate: f64,
        avg_response_time_ms: f64,
        workers_idle: i32,
        workers_busy: i32,
        pending_jobs: i32,
    ) -> DbResult<()> {
        let model = metrics_sample::ActiveModel {
            id: Set(Uuid::new_v4()),
            worker_id: Set(worker_id),
            sampled_at: Set(sampled_at),
            throughput_per_hour: Set(throughput_per_hour),
            success_rate: Set(success_rate),
            avg_response_time_ms: Set(avg_response_time_ms),
            workers_idle: Set(workers_idle),
            workers_busy: Set(workers_busy),
            pending_jobs: Set(pending_jobs),
        };
        model.insert(self.db.connection()).await?;
        Ok(())
    }
}

fn row_attempt(active: &retry_task::ActiveModel) -> i32 {
    match &active.attempt {
        sea_orm::ActiveValue::Set(v) | sea_orm::ActiveValue::Unchanged(v) => *v,
        sea_orm::ActiveValue::NotSet => 0,
    }
}
