//! `worker` table: one concurrent executor that claims and processes batches.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    #[sea_orm(string_value = "idle")]
    Idle,
    #[sea_orm(string_value = "busy")]
    Busy,
    #[sea_orm(string_value = "offline")]
    Offline,
    #[sea_orm(string_value = "error")]
    Error,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "worker")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub status: WorkerStatus,
    pub current_job_id: Option<Uuid>,
    #[sea_orm(default_value = 1)]
    pub max_concurrent_jobs: i32,
    pub rate_limit_per_minute: i32,
    pub rate_limit_per_hour: i32,
    pub last_heartbeat: DateTimeUtc,
    pub last_job_started_at: Option<DateTimeUtc>,
    pub last_job_completed_at: Option<DateTimeUtc>,
    #[sea_orm(default_value = 0)]
    pub total_jobs_processed: i32,
    #[sea_orm(default_value = 0)]
    pub total_emails_sent: i32,
    #[sea_orm(default_value = 0)]
    pub total_errors: i32,
    #[sea_orm(default_value = 0)]
    pub consecutive_failures: i32,
    /// Avg processing time, success rate, throughput/h — free-form for now.
    pub metrics: Json,
    pub config: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_stale(&self, now: chrono::DateTime<chrono::Utc>, staleness: chrono::Duration) -> bool {
        now - self.last_heartbeat > staleness
    }
}
