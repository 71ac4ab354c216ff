//! # dispatch-queue
//!
//! The Job Queue (component C2): turns a `JobSpec` into a Job row plus its
//! Batches, splitting recipients by `batch_size` and writing both in one
//! transaction so a Job is never observed without its Batches.
//!
//! There is deliberately no `dequeue()` on this crate: the store is the
//! queue. Workers pull the next claimable batch straight from
//! `dispatch_db::Store::claim_next_batch`, which survives restarts and
//! needs no in-process buffering.
//!
//! # Examples
//!
//! ```no_run
//! use dispatch_queue::{JobQueue, JobSpec, JobTemplate, Recipient};
//! use dispatch_db::entity::job::JobKind;
//! use uuid::Uuid;
//!
//! # async fn example(store: dispatch_db::Store) -> Result<(), Box<dyn std::error::Error>> {
//! let queue = JobQueue::new(store);
//!
//! let spec = JobSpec::new(
//!     Uuid::new_v4(),
//!     Uuid::new_v4(),
//!     JobKind::Campaign,
//!     JobTemplate {
//!         subject: "Hello".into(),
//!         html: "<p>hi {{name}}</p>".into(),
//!         text: None,
//!         from_email: "sender@example.com".into(),
//!         from_name: None,
//!         reply_to: None,
//!         tags: vec![],
//!     },
//!     vec![Recipient { id: "1".into(), email: "a@example.com".into(), display_name: None, custom_fields: Default::default() }],
//! );
//!
//! let job_id = queue.submit(spec).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{JobSpec, JobTemplate, Recipient, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_PRIORITY};
pub use queue::JobQueue;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::{QueueError, QueueResult};
    pub use crate::job::{JobSpec, JobTemplate, Recipient};
    pub use crate::queue::JobQueue;
}
