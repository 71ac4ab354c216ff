//! The Manager (component C7): process-wide supervisor. Holds every live
//! Worker plus its own Monitor and Retry Controller, and is the only
//! component with direct ownership of worker lifecycles — no module-level
//! global holds this state.

use std::sync::Arc;
use std::time::Duration;

use dispatch_config::DispatchConfig;
use dispatch_db::entity::worker::WorkerStatus;
use dispatch_db::Store;
use dispatch_log::{info, warn};
use dispatch_metrics::DispatchMetrics;
use dispatch_provider::Provider;
use dispatch_ratelimit::RateLimiter;
use dispatch_worker::retry::{RetryConfig, RetryController};
use dispatch_worker::worker::{self, WorkerConfig, WorkerHandle};
use thiserror::Error;

use crate::monitor::{Monitor, MonitorConfig};

/// Errors that can prevent a [`Manager`] from being constructed.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("rate limiter error: {0}")]
    RateLimit(#[from] dispatch_ratelimit::RateLimitError),

    #[error("metrics registration error: {0}")]
    Metrics(#[from] dispatch_metrics::prometheus::Error),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Whether each of the Manager's supervised components is still running,
/// reported by the Service façade's `health()`.
#[derive(Debug, Clone, Copy)]
pub struct ComponentHealth {
    pub manager: bool,
    pub retry: bool,
    pub monitor: bool,
}

/// Snapshot of queue/worker state used by the scale-up/scale-down decision.
#[derive(Debug, Clone, Copy)]
pub struct SystemStats {
    pub pending_batches: u64,
    pub processing_batches: u64,
    pub idle_workers: usize,
    pub worker_count: usize,
}

pub struct Manager {
    store: Store,
    provider: Arc<dyn Provider>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<DispatchMetrics>,
    config: DispatchConfig,
    workers: Vec<WorkerHandle>,
    monitor_stop: Option<tokio::sync::watch::Sender<bool>>,
    monitor_join: Option<(tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>)>,
    retry_stop: Option<tokio::sync::watch::Sender<bool>>,
    retry_join: Option<tokio::task::JoinHandle<()>>,
}

impl Manager {
    pub fn new(store: Store, provider: Arc<dyn Provider>, config: DispatchConfig) -> ManagerResult<Self> {
        let rate_limiter = Arc::new(
            RateLimiter::builder()
                .per_minute(config.rate_limit_per_minute)
                .per_hour(config.rate_limit_per_hour)
                .buffer_pct(config.rate_limit_buffer_pct)
                .store(Arc::new(store.clone()))
                .build()?,
        );
        let metrics = Arc::new(DispatchMetrics::new()?);

        Ok(Self {
            store,
            provider,
            rate_limiter,
            metrics,
            config,
            workers: Vec::new(),
            monitor_stop: None,
            monitor_join: None,
            retry_stop: None,
            retry_join: None,
        })
    }

    fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            heartbeat_interval: self.config.heartbeat_interval(),
            per_send_pacing: self.config.per_send_pacing(),
            rate_limit_per_minute: self.config.rate_limit_per_minute,
            rate_limit_per_hour: self.config.rate_limit_per_hour,
            retry_base_delay_secs: self.config.retry_base_delay_secs,
            retry_multiplier: self.config.retry_multiplier,
            retry_max_delay_secs: self.config.retry_max_delay_secs,
            retry_max_attempts: self.config.retry_max_attempts as i32,
            ..WorkerConfig::default()
        }
    }

    fn spawn_worker(&mut self) {
        let name = format!("worker-{}", self.workers.len() + 1);
        let handle = worker::spawn(
            name,
            self.store.clone(),
            self.provider.clone(),
            self.rate_limiter.clone(),
            self.metrics.clone(),
            self.worker_config(),
        );
        info!("manager spawned worker {}", handle.worker_id);
        self.workers.push(handle);
    }

    /// Spawn `minWorkers`, then start the Monitor and Retry Controller.
    /// Called once at process start.
    pub async fn start(&mut self, sink: Arc<dyn dispatch_audit::AlertSink>) {
        for _ in 0..self.config.min_workers {
            self.spawn_worker();
        }

        let monitor = Monitor::new(
            self.store.clone(),
            self.metrics.clone(),
            sink,
            MonitorConfig {
                metrics_interval: Duration::from_secs(self.config.metrics_interval_secs),
                alerts_interval: Duration::from_secs(self.config.alerts_interval_secs),
                staleness_timeout: self.config.staleness_timeout(),
                ..MonitorConfig::default()
            },
        );
        self.monitor_stop = Some(monitor.stop_handle());
        self.monitor_join = Some(monitor.spawn());

        let retry_controller = RetryController::new(
            self.store.clone(),
            self.provider.clone(),
            RetryConfig {
                check_interval: self.config.retry_check_interval(),
                batch_size: self.config.retry_batch_size as u64,
                base_delay_secs: self.config.retry_base_delay_secs,
                multiplier: self.config.retry_multiplier,
                max_delay_secs: self.config.retry_max_delay_secs,
            },
        );
        self.retry_stop = Some(retry_controller.stop_handle());
        self.retry_join = Some(retry_controller.spawn());
    }

    /// `systemStats` read, followed by the scale-up/scale-down decision.
    /// Called every `managerInterval`.
    pub async fn tick(&mut self) {
        let stats = match self.system_stats().await {
            Ok(s) => s,
            Err(e) => {
                warn!("manager failed to read system stats: {}", e);
                return;
            }
        };

        if stats.pending_batches > 0 && stats.idle_workers == 0 && self.workers.len() < self.config.max_workers {
            let to_add = (stats.pending_batches as f64 / 10.0).ceil() as usize;
            let capacity = self.config.max_workers - self.workers.len();
            let to_add = to_add.min(capacity).max(1);
            info!("manager scaling up by {} workers ({} pending batches)", to_add, stats.pending_batches);
            for _ in 0..to_add {
                self.spawn_worker();
            }
            return;
        }

        if stats.idle_workers > 2
            && stats.pending_batches + stats.processing_batches < 5
            && self.workers.len() > self.config.min_workers
        {
            let to_remove = stats.idle_workers / 2;
            let floor = self.config.min_workers;
            let to_remove = to_remove.min(self.workers.len().saturating_sub(floor));
            if to_remove > 0 {
                self.scale_down(to_remove).await;
            }
        }
    }

    /// Ids of every Worker currently held, live or not — used by the
    /// Service façade's `status()`.
    pub fn worker_ids(&self) -> Vec<uuid::Uuid> {
        self.workers.iter().map(|w| w.worker_id).collect()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether every spawned Worker's run loop and heartbeat task, the
    /// Monitor's two loops, and the Retry Controller are still running —
    /// used by the Service façade's `health()`.
    pub fn component_health(&self) -> ComponentHealth {
        let workers_alive = self.workers.iter().all(|w| !w.join.is_finished() && !w.heartbeat_join.is_finished());
        let monitor_alive = self
            .monitor_join
            .as_ref()
            .map(|(m, a)| !m.is_finished() && !a.is_finished())
            .unwrap_or(false);
        let retry_alive = self.retry_join.as_ref().map(|j| !j.is_finished()).unwrap_or(false);

        ComponentHealth { manager: workers_alive, retry: retry_alive, monitor: monitor_alive }
    }

    async fn system_stats(&self) -> dispatch_db::DbResult<SystemStats> {
        let pending_batches = self.store.pending_batch_count().await?;
        let processing_batches = self.store.processing_batch_count().await?;
        let db_workers = self.store.list_workers().await?;

        let live_ids: std::collections::HashSet<_> = self.workers.iter().map(|w| w.worker_id).collect();
        let idle_workers = db_workers
            .iter()
            .filter(|w| live_ids.contains(&w.id) && w.status == WorkerStatus::Idle)
            .count();

        Ok(SystemStats {
            pending_batches,
            processing_batches,
            idle_workers,
            worker_count: self.workers.len(),
        })
    }

    /// Stop the `count` idle workers with no current batch and the oldest
    /// `lastJobCompletedAt`.
    async fn scale_down(&mut self, count: usize) {
        let Ok(db_workers) = self.store.list_workers().await else { return };

        let mut idle: Vec<_> = db_workers
            .into_iter()
            .filter(|w| w.status == WorkerStatus::Idle && w.current_job_id.is_none())
            .collect();
        idle.sort_by_key(|w| w.last_job_completed_at.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC));

        let victims: Vec<_> = idle.into_iter().take(count).map(|w| w.id).collect();
        info!("manager scaling down {} workers", victims.len());

        self.workers.retain(|handle| {
            if victims.contains(&handle.worker_id) {
                handle.stop();
                false
            } else {
                true
            }
        });
    }

    /// Graceful shutdown: signal workers, let each finish its current batch,
    /// stop Monitor, stop Retry Controller.
    pub async fn shutdown(mut self) {
        for handle in &self.workers {
            handle.stop();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join.await;
            let _ = handle.heartbeat_join.await;
        }

        if let Some(stop) = self.monitor_stop.take() {
            let _ = stop.send(true);
        }
        if let Some((metrics_join, alerts_join)) = self.monitor_join.take() {
            let _ = metrics_join.await;
            let _ = alerts_join.await;
        }

        if let Some(stop) = self.retry_stop.take() {
            let _ = stop.send(true);
        }
        if let Some(retry_join) = self.retry_join.take() {
            let _ = retry_join.await;
        }

        info!("manager shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_testing::{test_store, MockProvider};

    fn config() -> DispatchConfig {
        DispatchConfig { min_workers: 1, max_workers: 4, ..DispatchConfig::default() }
    }

    async fn manager() -> Manager {
        let store = test_store().await.unwrap();
        let provider = Arc::new(MockProvider::always_ok());
        Manager::new(store, provider, config()).unwrap()
    }

    #[tokio::test]
    async fn start_spawns_min_workers_and_tick_does_nothing_on_an_empty_queue() {
        let mut manager = manager().await;
        let sink = Arc::new(dispatch_audit::MemoryBackend::new());

        manager.start(sink).await;
        assert_eq!(manager.workers.len(), 1);

        manager.tick().await;
        assert_eq!(manager.workers.len(), 1);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn tick_scales_up_when_batches_are_pending_and_no_worker_is_idle() {
        let mut manager = manager().await;
        manager.spawn_worker();
        // no worker row exists in the db for this handle, so system_stats
        // reads idle_workers == 0 even though one handle is held.
        let before = manager.workers.len();

        manager
            .store
            .create_job_with_batches(
                uuid::Uuid::new_v4(),
                uuid::Uuid::new_v4(),
                dispatch_db::entity::job::JobKind::Campaign,
                0,
                serde_json::json!({}),
                (0..25).map(|_| serde_json::json!({"email": "a@x.test"})).collect(),
                1,
                0,
                None,
            )
            .await
            .unwrap();

        manager.tick().await;

        assert_eq!(manager.workers.len(), before + 3);
    }

    #[tokio::test]
    async fn scale_down_leaves_workers_with_no_matching_idle_row_untouched() {
        let mut manager = manager().await;
        manager.spawn_worker();
        manager.spawn_worker();

        // Neither spawned worker has a row in the db (spawn_worker doesn't
        // register one outside the full Worker::spawn heartbeat task), so
        // scale_down finds nothing to stop and leaves both handles in place.
        manager.scale_down(1).await;

        assert_eq!(manager.workers.len(), 2);
    }
}
