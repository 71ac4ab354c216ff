//! # dispatch
//!
//! The email dispatch engine: submit a campaign, and a pool of Workers
//! claims its batches, sends each recipient through a pluggable Provider,
//! retries transient failures with backoff, and autoscales to the size of
//! the queue. [`Service`] is the embeddable entry point; the component
//! crates (`dispatch-queue`, `dispatch-worker`, `dispatch-manager`, ...) can
//! also be used directly by a host that wants finer-grained control.

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::{Service, ServiceHealth, ServiceStatus};

pub use dispatch_config::DispatchConfig;
pub use dispatch_db::entity::job::JobKind;
pub use dispatch_queue::{JobSpec, JobTemplate, Recipient};
