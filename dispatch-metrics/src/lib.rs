//! # dispatch-metrics
//!
//! Prometheus-style counters, gauges and histograms for the Monitor
//! (component C6): `sends_total`, `batches_claimed_total`,
//! `workers_idle`/`workers_busy`, `pending_jobs`, `send_duration_seconds`.
//!
//! # Quick Start
//!
//! ```no_run
//! use dispatch_metrics::{DispatchMetrics, export_metrics};
//!
//! let metrics = DispatchMetrics::new().unwrap();
//! metrics.sends_total.inc();
//!
//! let text = export_metrics();
//! ```

pub mod counter;
pub mod dispatch;
pub mod gauge;
pub mod histogram;
pub mod registry;

pub use counter::*;
pub use dispatch::DispatchMetrics;
pub use gauge::*;
pub use histogram::*;
pub use prometheus;
pub use registry::*;

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Global default registry.
static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();

    #[cfg(target_os = "linux")]
    {
        if let Err(e) = prometheus::default_registry()
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))
        {
            tracing::warn!("failed to register process collector: {}", e);
        }
    }

    registry
});

/// Get the default metrics registry.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Export all metrics as Prometheus text format.
pub fn export_metrics() -> String {
    export_metrics_from_registry(&DEFAULT_REGISTRY)
}

/// Export metrics from a specific registry.
pub fn export_metrics_from_registry(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("# Error converting metrics to UTF-8\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_is_accessible() {
        let registry = default_registry();
        let _ = registry.gather();
    }

    #[test]
    fn export_metrics_never_panics() {
        let metrics = export_metrics();
        assert!(metrics.contains("# HELP") || metrics.is_empty());
    }
}
