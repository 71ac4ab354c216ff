//! `metrics_sample` table: hourly aggregate written by the Monitor's metrics loop.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "metrics_sample")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub worker_id: Option<Uuid>,
    /// Rounded down to the hour.
    pub sampled_at: DateTimeUtc,
    pub throughput_per_hour: f64,
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub workers_idle: i32,
    pub workers_busy: i32,
    pub pending_jobs: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
