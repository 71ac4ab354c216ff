//! # dispatch-worker
//!
//! The Worker (component C3) and Retry Controller (component C4): the two
//! loops that actually talk to the Provider. A Worker claims batches and
//! sends to their recipients in order; the Retry Controller scans for due
//! `RetryTask` rows and re-attempts the single recipient each one names.
//!
//! Both loops are plain `tokio::spawn` tasks coordinated with a
//! `tokio::sync::watch` stop channel.

pub mod error;
pub mod retry;
pub mod template;
pub mod worker;

pub use error::{WorkerError, WorkerResult};
pub use retry::{RetryConfig, RetryController};
pub use worker::{spawn, WorkerConfig, WorkerHandle};
