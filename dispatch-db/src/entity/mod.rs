//! Entities for every table the dispatch engine owns.

pub mod batch;
pub mod job;
pub mod metrics_sample;
pub mod rate_counter;
pub mod retry_task;
pub mod send_record;
pub mod worker;

pub use batch::{BatchStatus, Entity as Batch};
pub use job::{Entity as Job, JobKind, JobStatus};
pub use metrics_sample::Entity as MetricsSample;
pub use rate_counter::{Entity as RateCounter, RateWindow};
pub use retry_task::{Entity as RetryTask, RetryStatus};
pub use send_record::{Entity as SendRecord, SendStatus};
pub use worker::{Entity as Worker, WorkerStatus};
