//! Prometheus metrics for the aggregator
//!
//! - Probe counts and durations per target
//! - Aggregate check outcomes

use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Aggregator metrics registry
///
/// Clone is cheap (metric handles are Arc internally).
#[derive(Clone)]
pub struct AggregatorMetrics {
    registry: Registry,
    /// Probes by target and outcome (healthy, unhealthy)
    pub probes_total: IntCounterVec,
    /// Probe duration in seconds, timeouts included
    pub probe_duration_seconds: HistogramVec,
    /// Aggregate checks by outcome (healthy, unhealthy, error)
    pub checks_total: IntCounterVec,
}

impl AggregatorMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let probes_total = IntCounterVec::new(
            Opts::new("fleetcheck_probes_total", "Total number of target probes"),
            &["target", "status"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "fleetcheck_probe_duration_seconds",
                "Duration of target probes in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["target"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let checks_total = IntCounterVec::new(
            Opts::new(
                "fleetcheck_checks_total",
                "Total number of aggregate health checks",
            ),
            &["status"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        Ok(Self {
            registry,
            probes_total,
            probe_duration_seconds,
            checks_total,
        })
    }

    /// Record one finished probe
    pub fn record_probe(&self, target: &str, status: &str, duration_secs: f64) {
        self.probes_total.with_label_values(&[target, status]).inc();
        self.probe_duration_seconds
            .with_label_values(&[target])
            .observe(duration_secs);
    }

    /// Record one aggregate check (healthy, unhealthy, error)
    pub fn record_check(&self, status: &str) {
        self.checks_total.with_label_values(&[status]).inc();
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

/// Shared metrics handle
pub type SharedMetrics = Arc<AggregatorMetrics>;

/// Create a new shared metrics instance
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(AggregatorMetrics::new()?))
}
