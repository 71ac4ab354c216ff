//! `job` table: the unit of work submitted for one campaign send.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "retrying")]
    Retrying,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[sea_orm(string_value = "campaign")]
    Campaign,
    #[sea_orm(string_value = "automation")]
    Automation,
    #[sea_orm(string_value = "transactional")]
    Transactional,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub campaign_id: Uuid,
    pub priority: i32,
    pub status: JobStatus,
    pub kind: JobKind,
    /// Template + sender + tracking tags + recipient list reference.
    pub payload: Json,
    pub batch_size: i32,
    pub total_recipients: i32,
    #[sea_orm(default_value = 0)]
    pub processed_count: i32,
    #[sea_orm(default_value = 0)]
    pub failed_count: i32,
    #[sea_orm(default_value = 0)]
    pub retry_count: i32,
    #[sea_orm(default_value = 3)]
    pub max_retries: i32,
    pub scheduled_at: Option<DateTimeUtc>,
    pub started_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub failed_at: Option<DateTimeUtc>,
    pub error_message: Option<String>,
    pub owner_worker_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch::Entity")]
    Batch,
    #[sea_orm(has_many = "super::send_record::Entity")]
    SendRecord,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::send_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SendRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn is_claimable_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.scheduled_at {
            Some(at) => now >= at,
            None => true,
        }
    }
}
