//! The concrete set of metrics the Monitor maintains: counters for sends
//! and claims, gauges for worker/queue state, and a histogram for send
//! latency.

use crate::histogram::DEFAULT_LATENCY_BUCKETS;
use crate::{CounterBuilder, GaugeBuilder, HistogramBuilder};
use prometheus::{Counter, Gauge, Histogram};

/// The Monitor's metrics registry. One instance per process, owned by the
/// Monitor and shared (read-only, via `Arc`) with Workers that increment
/// `sends_total`/`send_duration_seconds` as they go.
pub struct DispatchMetrics {
    pub sends_total: Counter,
    pub batches_claimed_total: Counter,
    pub workers_idle: Gauge,
    pub workers_busy: Gauge,
    pub pending_jobs: Gauge,
    pub send_duration_seconds: Histogram,
}

impl DispatchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            sends_total: CounterBuilder::new("sends_total", "Total email send attempts").register()?,
            batches_claimed_total: CounterBuilder::new(
                "batches_claimed_total",
                "Total batches claimed by workers",
            )
            .register()?,
            workers_idle: GaugeBuilder::new("workers_idle", "Workers currently idle").register()?,
            workers_busy: GaugeBuilder::new("workers_busy", "Workers currently processing a batch").register()?,
            pending_jobs: GaugeBuilder::new("pending_jobs", "Jobs waiting to be claimed").register()?,
            send_duration_seconds: HistogramBuilder::new(
                "send_duration_seconds",
                "Time to send a single email via the Provider",
            )
            .buckets(DEFAULT_LATENCY_BUCKETS.to_vec())
            .register()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_registers_every_metric() {
        let metrics = DispatchMetrics::new().unwrap();
        metrics.sends_total.inc();
        metrics.workers_idle.set(2.0);
        metrics.send_duration_seconds.observe(0.05);
        assert_eq!(metrics.sends_total.get(), 1.0);
    }
}
