//! In-memory [`RateLimitStore`] for tests, backed by a `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::{RateLimitResult, RateLimitStore, Window};

fn window_secs(window: Window) -> u64 {
    match window {
        Window::Minute => 60,
        Window::Hour => 3600,
    }
}

fn window_start(window: Window) -> u64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let secs = window_secs(window);
    (now / secs) * secs
}

/// Per-(worker, window, window_start) counters. Not durable across process
/// restarts — fine for tests, not for production.
#[derive(Default)]
pub struct MemoryStore {
    counts: DashMap<(Uuid, Window, u64), u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn allowed(&self, worker_id: Uuid, window: Window, limit: u64, n: u64) -> RateLimitResult<bool> {
        let key = (worker_id, window, window_start(window));
        let current = self.counts.get(&key).map(|v| *v).unwrap_or(0);
        Ok(current + n <= limit)
    }

    async fn record(&self, worker_id: Uuid, window: Window, n: u64) -> RateLimitResult<()> {
        let key = (worker_id, window, window_start(window));
        *self.counts.entry(key).or_insert(0) += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_counts_per_window() {
        let store = MemoryStore::new();
        let worker = Uuid::new_v4();

        assert!(store.allowed(worker, Window::Minute, 10, 5).await.unwrap());
        store.record(worker, Window::Minute, 5).await.unwrap();
        assert!(store.allowed(worker, Window::Minute, 10, 5).await.unwrap());
        store.record(worker, Window::Minute, 5).await.unwrap();
        assert!(!store.allowed(worker, Window::Minute, 10, 1).await.unwrap());
    }

    #[tokio::test]
    async fn windows_are_independent() {
        let store = MemoryStore::new();
        let worker = Uuid::new_v4();
        store.record(worker, Window::Minute, 10).await.unwrap();
        assert!(store.allowed(worker, Window::Hour, 10, 10).await.unwrap());
    }
}
