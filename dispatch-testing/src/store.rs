//! A SQLite-backed [`Store`] for tests. SeaORM entities carry no migration
//! of their own, so schema creation here is hand-written DDL matching the
//! six tables in `dispatch_db::entity` exactly.
//!
//! `Store::claim_next_batch` issues Postgres-specific SQL (`FOR UPDATE OF
//! ... SKIP LOCKED`, `NULLS FIRST`, numbered placeholders) that SQLite does
//! not accept; scenarios that exercise batch claiming need a real Postgres
//! instance. Everything else — job/batch creation, worker lifecycle, send
//! records, retry tasks, rate counters — runs fine against the in-memory
//! schema below.

use dispatch_db::{Database, DatabaseConfig, DbResult, Store};
use sea_orm::{ConnectionTrait, Statement};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE job (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        priority INTEGER NOT NULL,
        status TEXT NOT NULL,
        kind TEXT NOT NULL,
        payload TEXT NOT NULL,
        batch_size INTEGER NOT NULL,
        total_recipients INTEGER NOT NULL,
        processed_count INTEGER NOT NULL DEFAULT 0,
        failed_count INTEGER NOT NULL DEFAULT 0,
        retry_count INTEGER NOT NULL DEFAULT 0,
        max_retries INTEGER NOT NULL DEFAULT 3,
        scheduled_at TEXT,
        started_at TEXT,
        completed_at TEXT,
        failed_at TEXT,
        error_message TEXT,
        owner_worker_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE batch (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        "index" INTEGER NOT NULL,
        recipients TEXT NOT NULL,
        status TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT,
        sent INTEGER NOT NULL DEFAULT 0,
        failed INTEGER NOT NULL DEFAULT 0,
        error_message TEXT
    )"#,
    r#"CREATE TABLE worker (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        current_job_id TEXT,
        max_concurrent_jobs INTEGER NOT NULL DEFAULT 1,
        rate_limit_per_minute INTEGER NOT NULL,
        rate_limit_per_hour INTEGER NOT NULL,
        last_heartbeat TEXT NOT NULL,
        last_job_started_at TEXT,
        last_job_completed_at TEXT,
        total_jobs_processed INTEGER NOT NULL DEFAULT 0,
        total_emails_sent INTEGER NOT NULL DEFAULT 0,
        total_errors INTEGER NOT NULL DEFAULT 0,
        consecutive_failures INTEGER NOT NULL DEFAULT 0,
        metrics TEXT NOT NULL,
        config TEXT NOT NULL
    )"#,
    r#"CREATE TABLE send_record (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        job_id TEXT NOT NULL,
        recipient_id TEXT NOT NULL,
        email TEXT NOT NULL,
        status TEXT NOT NULL,
        provider_message_id TEXT,
        sent_at TEXT,
        error_message TEXT,
        UNIQUE (job_id, recipient_id)
    )"#,
    r#"CREATE TABLE retry_task (
        id TEXT PRIMARY KEY,
        original_job_id TEXT NOT NULL,
        send_record_id TEXT NOT NULL,
        attempt INTEGER NOT NULL DEFAULT 0,
        max_attempts INTEGER NOT NULL DEFAULT 3,
        next_attempt_at TEXT NOT NULL,
        status TEXT NOT NULL,
        error_message TEXT
    )"#,
    r#"CREATE TABLE rate_counter (
        id TEXT PRIMARY KEY,
        worker_id TEXT NOT NULL,
        window TEXT NOT NULL,
        window_start TEXT NOT NULL,
        count INTEGER NOT NULL DEFAULT 0,
        UNIQUE (worker_id, window, window_start)
    )"#,
    r#"CREATE TABLE metrics_sample (
        id TEXT PRIMARY KEY,
        worker_id TEXT,
        sampled_at TEXT NOT NULL,
        throughput_per_hour REAL NOT NULL,
        success_rate REAL NOT NULL,
        avg_response_time_ms REAL NOT NULL,
        workers_idle INTEGER NOT NULL,
        workers_busy INTEGER NOT NULL,
        pending_jobs INTEGER NOT NULL
    )"#,
];

/// Connect to a fresh in-memory SQLite database and apply the schema above.
pub async fn test_database() -> DbResult<Database> {
    let config = DatabaseConfig::new("sqlite::memory:");
    let db = Database::connect(config).await?;

    let backend = db.connection().get_database_backend();
    for ddl in SCHEMA {
        db.connection()
            .execute(Statement::from_string(backend, ddl.to_string()))
            .await?;
    }

    Ok(db)
}

/// Build a [`Store`] wrapping a fresh in-memory SQLite database.
pub async fn test_store() -> DbResult<Store> {
    Ok(Store::new(test_database().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_connects_and_applies_schema() {
        let store = test_store().await.unwrap();
        assert_eq!(store.pending_job_count().await.unwrap(), 0);
    }
}
