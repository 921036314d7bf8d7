//! Fleet health aggregation
//!
//! On every check the aggregator probes each registered target concurrently,
//! waits for all probes, and combines them with an all-must-be-healthy rule.
//! A failing target only ever downgrades its own entry.

pub mod metrics;
pub mod probe;
pub mod report;
pub mod target;

pub use metrics::{create_metrics, AggregatorMetrics, SharedMetrics};
pub use probe::{HttpProber, ProbeError, Prober, DEFAULT_PROBE_TIMEOUT};
pub use report::{AggregateReport, HealthStatus, ProbeResult};
pub use target::{Target, TargetError, TargetRegistry, DEFAULT_TARGETS};

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

/// Failure of the fan-out itself, never of an individual target
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("Probe task for '{target}' did not complete: {source}")]
    Join {
        target: String,
        #[source]
        source: JoinError,
    },
}

/// Health-check aggregator over a fixed target registry
pub struct Aggregator {
    registry: TargetRegistry,
    prober: Arc<dyn Prober>,
    probe_timeout: Duration,
    metrics: Option<SharedMetrics>,
}

impl Aggregator {
    pub fn new(
        registry: TargetRegistry,
        prober: Arc<dyn Prober>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            prober,
            probe_timeout,
            metrics: None,
        }
    }

    /// Attach a metrics registry for probe and check counters
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every target and build the aggregate report
    ///
    /// Probes run as independent tasks. Results are collected in registry
    /// order regardless of completion order. Per-target failures become
    /// `unhealthy` entries; only a probe task that cannot be joined fails
    /// the whole check.
    pub async fn check_health(&self) -> Result<AggregateReport, AggregatorError> {
        let handles = self
            .registry
            .iter()
            .map(|target| {
                let target = target.clone();
                let prober = Arc::clone(&self.prober);
                let timeout = self.probe_timeout;
                let metrics = self.metrics.clone();
                tokio::spawn(async move {
                    run_probe(prober.as_ref(), &target, timeout, metrics.as_deref()).await
                })
            })
            .collect::<Vec<_>>();

        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(joined.len());
        for (target, outcome) in self.registry.iter().zip(joined) {
            match outcome {
                Ok(result) => results.push(result),
                Err(source) => {
                    error!(target = %target.name, error = %source, "Probe task failed");
                    if let Some(ref metrics) = self.metrics {
                        metrics.record_check("error");
                    }
                    return Err(AggregatorError::Join {
                        target: target.name.clone(),
                        source,
                    });
                }
            }
        }

        let report = AggregateReport::from_results(results);
        if let Some(ref metrics) = self.metrics {
            metrics.record_check(report.overall_status.as_str());
        }
        debug!(
            targets = report.results.len(),
            unhealthy = report.unhealthy_count(),
            status = report.overall_status.as_str(),
            "Aggregate health check completed"
        );

        Ok(report)
    }
}

/// Run one bounded probe and classify it
///
/// The timeout cancels only this probe.
async fn run_probe(
    prober: &dyn Prober,
    target: &Target,
    timeout: Duration,
    metrics: Option<&AggregatorMetrics>,
) -> ProbeResult {
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, prober.probe(target)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    };

    let result = match outcome {
        Ok(()) => ProbeResult::healthy(&target.name),
        Err(e) => {
            warn!(target = %target.name, endpoint = %target.endpoint, error = %e, "Probe failed");
            ProbeResult::unhealthy(&target.name)
        }
    };

    if let Some(metrics) = metrics {
        metrics.record_probe(
            &target.name,
            result.status.as_str(),
            start.elapsed().as_secs_f64(),
        );
    }

    result
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
