//! Health probes against downstream targets
//!
//! - `Prober` trait for abstraction
//! - `HttpProber` issues a plain GET and treats any 2xx as healthy
//!
//! The response body is never inspected.

use crate::aggregator::target::Target;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Why a probe was classified unhealthy
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProbeError {
    #[error("Target unreachable: {0}")]
    Unreachable(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("Target returned HTTP {0}")]
    Status(u16),
}

/// A single health check against one target
///
/// Implementations must not retry; one call is one probe.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError>;
}

/// HTTP GET prober used in production
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build probe HTTP client, using default");
                reqwest::Client::new()
            }
        };
        Self { client, timeout }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(target.endpoint.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(self.timeout)
                } else {
                    ProbeError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        Ok(())
    }
}
