//! Implements [`dispatch_ratelimit::RateLimitStore`] for the Store Gateway,
//! backed by the `rate_counter` table.

use async_trait::async_trait;
use dispatch_ratelimit::{RateLimitError, RateLimitResult, RateLimitStore, Window};
use uuid::Uuid;

use crate::entity::RateWindow;
use crate::Store;

fn to_rate_window(window: Window) -> RateWindow {
    match window {
        Window::Minute => RateWindow::Minute,
        Window::Hour => RateWindow::Hour,
    }
}

#[async_trait]
impl RateLimitStore for Store {
    async fn allowed(&self, worker_id: Uuid, window: Window, limit: u64, n: u64) -> RateLimitResult<bool> {
        self.allowed_send(worker_id, to_rate_window(window), limit, n)
            .await
            .map_err(|e| RateLimitError::store(e.to_string()))
    }

    async fn record(&self, worker_id: Uuid, window: Window, n: u64) -> RateLimitResult<()> {
        self.record_send(worker_id, to_rate_window(window), n)
            .await
            .map_err(|e| RateLimitError::store(e.to_string()))
    }
}
