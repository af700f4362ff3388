//! Tracing setup and ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Counters for fetched records and daily report builds
#[derive(Debug, Default)]
pub struct IngestMetrics {
    records_fetched: AtomicU64,
    records_dropped: AtomicU64,
    reports_built: AtomicU64,
    reports_loaded: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_fetched(&self, count: usize) {
        self.records_fetched.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "records_fetched", count, "Metric incremented");
    }

    pub fn records_dropped(&self, count: usize) {
        self.records_dropped.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "records_dropped", count, "Metric incremented");
    }

    pub fn report_built(&self) {
        self.reports_built.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "reports_built", "Metric incremented");
    }

    pub fn report_loaded(&self) {
        self.reports_loaded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "reports_loaded", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            reports_built: self.reports_built.load(Ordering::Relaxed),
            reports_loaded: self.reports_loaded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_fetched: u64,
    pub records_dropped: u64,
    pub reports_built: u64,
    pub reports_loaded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = IngestMetrics::new();
        metrics.records_fetched(3);
        metrics.records_fetched(2);
        metrics.records_dropped(1);
        metrics.report_built();
        metrics.report_loaded();
        metrics.report_loaded();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                records_fetched: 5,
                records_dropped: 1,
                reports_built: 1,
                reports_loaded: 2,
            }
        );
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
