//! The Monitor (component C6): two independent periodic loops, one
//! aggregating throughput/success-rate into a `metrics_sample` row and one
//! evaluating alert thresholds against an injected [`AlertSink`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_audit::{Alert, AlertLevel, AlertSink};
use dispatch_db::entity::worker::WorkerStatus;
use dispatch_db::Store;
use dispatch_log::{error, warn};
use dispatch_metrics::DispatchMetrics;
use tokio::sync::watch;

/// Thresholds and periods for the Monitor's two loops: `pendingJobs >
/// maxQueueSize`, `avgThroughput < minThroughput`, stale heartbeats,
/// `consecutiveFailures > 5`.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub metrics_interval: Duration,
    pub alerts_interval: Duration,
    pub staleness_timeout: Duration,
    pub max_queue_size: u64,
    pub min_throughput_per_hour: f64,
    pub max_consecutive_failures: i32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            metrics_interval: Duration::from_secs(60),
            alerts_interval: Duration::from_secs(300),
            staleness_timeout: Duration::from_secs(120),
            max_queue_size: 1000,
            min_throughput_per_hour: 10.0,
            max_consecutive_failures: 5,
        }
    }
}

pub struct Monitor {
    store: Store,
    metrics: Arc<DispatchMetrics>,
    sink: Arc<dyn AlertSink>,
    config: MonitorConfig,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl Monitor {
    pub fn new(store: Store, metrics: Arc<DispatchMetrics>, sink: Arc<dyn AlertSink>, config: MonitorConfig) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self { store, metrics, sink, config, stop_tx, stop_rx }
    }

    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// A sender the Manager can hold onto after `spawn` consumes `self`, so
    /// it can still signal both loops to stop.
    pub fn stop_handle(&self) -> watch::Sender<bool> {
        self.stop_tx.clone()
    }

    /// Spawn both loops. Returns their join handles so the Manager can wait
    /// on graceful shutdown.
    pub fn spawn(self) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
        let metrics_loop = {
            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let config = self.config.clone();
            let mut stop_rx = self.stop_rx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(config.metrics_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = metrics_tick(&store, &metrics).await {
                                error!("monitor metrics tick failed: {}", e);
                            }
                            if let Err(e) = store.reclaim_stale_jobs(Utc::now(), chrono::Duration::from_std(config.staleness_timeout).unwrap()).await {
                                error!("monitor reclaim_stale_jobs failed: {}", e);
                            }
                        }
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() { break; }
                        }
                    }
                }
            })
        };

        let alerts_loop = {
            let store = self.store.clone();
            let sink = self.sink.clone();
            let config = self.config.clone();
            let mut stop_rx = self.stop_rx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(config.alerts_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = alerts_tick(&store, sink.as_ref(), &config).await {
                                error!("monitor alerts tick failed: {}", e);
                            }
                        }
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() { break; }
                        }
                    }
                }
            })
        };

        (metrics_loop, alerts_loop)
    }
}

async fn metrics_tick(store: &Store, metrics: &DispatchMetrics) -> dispatch_db::DbResult<()> {
    let workers = store.list_workers().await?;
    let idle = workers.iter().filter(|w| w.status == WorkerStatus::Idle).count() as i32;
    let busy = workers.iter().filter(|w| w.status == WorkerStatus::Busy).count() as i32;
    let pending_jobs = store.pending_job_count().await? as i32;

    metrics.workers_idle.set(idle as f64);
    metrics.workers_busy.set(busy as f64);
    metrics.pending_jobs.set(pending_jobs as f64);

    let now = Utc::now();
    let sent = store.sends_in_last_hour(now).await?;
    let failed = store.failed_send_count().await?;
    let total = sent + failed;
    let success_rate = if total == 0 { 1.0 } else { sent as f64 / total as f64 };

    store
        .record_metrics_sample(None, round_to_hour(now), sent as f64, success_rate, 0.0, idle, busy, pending_jobs)
        .await?;

    Ok(())
}

async fn alerts_tick(store: &Store, sink: &dyn AlertSink, config: &MonitorConfig) -> dispatch_db::DbResult<()> {
    let now = Utc::now();
    let pending_jobs = store.pending_job_count().await?;
    if pending_jobs > config.max_queue_size {
        emit(sink, Alert::new("pending_jobs_exceeded", AlertLevel::Warning, format!("{pending_jobs} jobs pending, max is {}", config.max_queue_size))).await;
    }

    let sent = store.sends_in_last_hour(now).await?;
    if (sent as f64) < config.min_throughput_per_hour {
        emit(sink, Alert::new("throughput_below_minimum", AlertLevel::Warning, format!("{sent} sends in the last hour, minimum is {}", config.min_throughput_per_hour))).await;
    }

    let staleness = chrono::Duration::from_std(config.staleness_timeout).unwrap();
    for worker in store.list_workers().await? {
        if worker.is_stale(now, staleness) {
            emit(
                sink,
                Alert::new("worker_stale", AlertLevel::High, format!("worker {} has not sent a heartbeat since {}", worker.id, worker.last_heartbeat))
                    .worker(worker.id),
            )
            .await;
        }
        if worker.consecutive_failures > config.max_consecutive_failures {
            emit(
                sink,
                Alert::new("worker_consecutive_failures", AlertLevel::Critical, format!("worker {} has {} consecutive failures", worker.id, worker.consecutive_failures))
                    .worker(worker.id),
            )
            .await;
        }
    }

    Ok(())
}

async fn emit(sink: &dyn AlertSink, alert: Alert) {
    if let Err(e) = sink.emit(&alert).await {
        warn!("failed to emit alert {}: {}", alert.kind, e);
    }
}

fn round_to_hour(ts: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    use chrono::Timelike;
    ts.date_naive().and_hms_opt(ts.hour(), 0, 0).unwrap().and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_testing::test_store;

    #[tokio::test]
    async fn metrics_tick_records_a_sample_with_no_workers() {
        let store = test_store().await.unwrap();
        let metrics = Arc::new(DispatchMetrics::new().unwrap());

        metrics_tick(&store, &metrics).await.unwrap();

        assert_eq!(metrics.workers_idle.get(), 0.0);
        assert_eq!(metrics.pending_jobs.get(), 0.0);
    }

    #[tokio::test]
    async fn alerts_tick_flags_an_empty_queue_as_below_throughput() {
        let store = test_store().await.unwrap();
        let sink = Arc::new(dispatch_audit::MemoryBackend::new());
        let config = MonitorConfig::default();

        alerts_tick(&store, sink.as_ref(), &config).await.unwrap();

        let alerts = sink.alerts().await;
        assert!(alerts.iter().any(|a| a.kind == "throughput_below_minimum"));
    }
}
