//! # dispatch-testing
//!
//! Shared test doubles for the email dispatch engine: a scriptable
//! [`MockProvider`] standing in for the SendGrid API, and a SQLite-backed
//! [`Store`](dispatch_db::Store) builder for integration tests that need a
//! real database without a Postgres instance.

mod mock;
mod store;

pub use mock::MockProvider;
pub use store::{test_database, test_store};

pub use dispatch_audit::MemoryBackend;

#[cfg(test)]
mod tests {
    #[test]
    fn module_exports_are_accessible() {
        // Ensure module compiles
    }
}
