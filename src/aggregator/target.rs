//! Downstream targets monitored by the aggregator
//!
//! The registry is built once at startup and never mutated. Order matters:
//! aggregate reports list targets in registry order.

use reqwest::Url;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building the target registry
#[derive(Debug, Error, PartialEq)]
pub enum TargetError {
    #[error("Target name must not be empty")]
    EmptyName,

    #[error("Duplicate target name: {0}")]
    DuplicateName(String),

    #[error("Invalid endpoint for target '{name}': {reason}")]
    InvalidEndpoint { name: String, reason: String },
}

/// A downstream service identified by name and health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub endpoint: Url,
}

impl Target {
    /// Build a target, validating that the endpoint is an absolute http(s) URL
    pub fn new(name: impl Into<String>, endpoint: &str) -> Result<Self, TargetError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TargetError::EmptyName);
        }

        let endpoint = Url::parse(endpoint).map_err(|e| TargetError::InvalidEndpoint {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        match endpoint.scheme() {
            "http" | "https" => Ok(Self { name, endpoint }),
            other => Err(TargetError::InvalidEndpoint {
                name,
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

/// Ordered, immutable set of targets
///
/// Clone is cheap (Arc internally).
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Arc<[Target]>,
}

impl TargetRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(targets: Vec<Target>) -> Result<Self, TargetError> {
        {
            let mut seen = HashSet::new();
            for target in &targets {
                if !seen.insert(target.name.as_str()) {
                    return Err(TargetError::DuplicateName(target.name.clone()));
                }
            }
        }

        Ok(Self {
            targets: targets.into(),
        })
    }

    /// The sample fleet: five language services on ports 8081-8085
    pub fn sample() -> Self {
        let targets = DEFAULT_TARGETS
            .iter()
            .filter_map(|(name, url)| Target::new(*name, url).ok())
            .collect::<Vec<_>>();
        Self {
            targets: targets.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Default registry used when no targets are configured
pub const DEFAULT_TARGETS: &[(&str, &str)] = &[
    ("python", "http://localhost:8081/healthz"),
    ("golang", "http://localhost:8082/healthz"),
    ("nodejs", "http://localhost:8083/healthz"),
    ("ballerina", "http://localhost:8084/healthz"),
    ("java", "http://localhost:8085/healthz"),
];
