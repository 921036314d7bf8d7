//! Probe results and the aggregate report returned by `/health`

use serde::{Deserialize, Serialize};

/// Health of a single target or of the whole fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of one probe against one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(rename = "service")]
    pub target_name: String,
    pub status: HealthStatus,
}

impl ProbeResult {
    pub fn healthy(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            status: HealthStatus::Healthy,
        }
    }

    pub fn unhealthy(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            status: HealthStatus::Unhealthy,
        }
    }
}

/// Combined verdict plus per-target detail
///
/// `results` is always in registry order, one entry per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    #[serde(rename = "status")]
    pub overall_status: HealthStatus,
    #[serde(rename = "services")]
    pub results: Vec<ProbeResult>,
}

impl AggregateReport {
    /// Build a report; overall status is healthy iff every entry is healthy
    ///
    /// An empty result list is vacuously healthy.
    pub fn from_results(results: Vec<ProbeResult>) -> Self {
        let overall_status = if results.iter().all(|r| r.status.is_healthy()) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            overall_status,
            results,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status.is_healthy()
    }

    /// Number of targets reported unhealthy
    pub fn unhealthy_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.status.is_healthy())
            .count()
    }
}
