//! `retry_task` table: a scheduled, per-recipient re-attempt.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum RetryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "abandoned")]
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retry_task")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub original_job_id: Uuid,
    pub send_record_id: Uuid,
    #[sea_orm(default_value = 0)]
    pub attempt: i32,
    #[sea_orm(default_value = 3)]
    pub max_attempts: i32,
    pub next_attempt_at: DateTimeUtc,
    pub status: RetryStatus,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// `delay(n) = min(baseDelay * multiplier^(n-1), maxDelay)`.
    pub fn backoff_delay(
        attempt: i32,
        base_delay_secs: u64,
        multiplier: u32,
        max_delay_secs: u64,
    ) -> chrono::Duration {
        let attempt = attempt.max(1) as u32;
        let raw = (base_delay_secs as f64) * (multiplier as f64).powi(attempt as i32 - 1);
        let capped = raw.min(max_delay_secs as f64) as i64;
        chrono::Duration::seconds(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_matches_component_design_defaults() {
        assert_eq!(Model::backoff_delay(1, 300, 3, 7200), chrono::Duration::seconds(300));
        assert_eq!(Model::backoff_delay(2, 300, 3, 7200), chrono::Duration::seconds(900));
        assert_eq!(Model::backoff_delay(3, 300, 3, 7200), chrono::Duration::seconds(2700));
        // 300 * 3^3 = 8100, clamped to maxDelay
        assert_eq!(Model::backoff_delay(4, 300, 3, 7200), chrono::Duration::seconds(7200));
    }
}
