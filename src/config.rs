//! Environment-driven configuration for the three binaries
//!
//! Each config has a `from_env()` used by `main` and a `from_lookup()` that
//! takes any key lookup, so parsing can be tested without touching the
//! process environment.

use crate::aggregator::{Target, TargetError, TargetRegistry, DEFAULT_PROBE_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default aggregator port
pub const DEFAULT_AGGREGATOR_PORT: u16 = 8080;

/// Default echo service port
pub const DEFAULT_ECHO_PORT: u16 = 8086;

/// Default echo service name
pub const DEFAULT_ECHO_SERVICE_NAME: &str = "rust";

/// Default plain-HTTP (redirect) port for the web app
pub const DEFAULT_WEBAPP_HTTP_PORT: u16 = 8000;

/// Default HTTPS port for the web app
pub const DEFAULT_WEBAPP_HTTPS_PORT: u16 = 8443;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Malformed target entry '{0}', expected name=url")]
    MalformedTarget(String),

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// Parse an optional variable, falling back to a default
fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

/// Parse a boolean flag ("true"/"1" vs "false"/"0")
fn flag_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
            reason: "expected true, false, 1 or 0".to_string(),
        }),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Aggregator configuration
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub port: u16,
    pub targets: TargetRegistry,
    pub probe_timeout: Duration,
}

impl AggregatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from a key lookup
    ///
    /// - `FLEETCHECK_PORT` (default 8080)
    /// - `FLEETCHECK_TARGETS` as `name=url,name=url` (default: sample fleet;
    ///   an empty value yields an empty registry)
    /// - `FLEETCHECK_PROBE_TIMEOUT_MS` (default 3000, must be > 0)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "FLEETCHECK_PORT", DEFAULT_AGGREGATOR_PORT)?;

        let targets = match lookup("FLEETCHECK_TARGETS") {
            Some(raw) => parse_targets(&raw)?,
            None => TargetRegistry::sample(),
        };

        let timeout_ms = parse_or(
            &lookup,
            "FLEETCHECK_PROBE_TIMEOUT_MS",
            DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FLEETCHECK_PROBE_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        Ok(Self {
            port,
            targets,
            probe_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_AGGREGATOR_PORT,
            targets: TargetRegistry::sample(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Parse `name=url,name=url` into a registry, keeping order
pub fn parse_targets(raw: &str) -> Result<TargetRegistry, ConfigError> {
    let targets = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<Target, ConfigError> {
            let (name, url) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedTarget(entry.to_string()))?;
            Ok(Target::new(name.trim(), url.trim())?)
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(TargetRegistry::new(targets)?)
}

/// Echo service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EchoConfig {
    pub service_name: String,
    pub port: u16,
}

impl EchoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = lookup("ECHO_SERVICE_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ECHO_SERVICE_NAME.to_string());
        let port = parse_or(&lookup, "ECHO_PORT", DEFAULT_ECHO_PORT)?;

        Ok(Self { service_name, port })
    }
}

/// TLS web app configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WebAppConfig {
    pub http_port: u16,
    pub https_port: u16,
    pub static_dir: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    /// Generate a self-signed bundle when the PEM files are missing
    pub self_signed: bool,
}

impl WebAppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_port = parse_or(&lookup, "WEBAPP_HTTP_PORT", DEFAULT_WEBAPP_HTTP_PORT)?;
        let https_port = parse_or(&lookup, "WEBAPP_HTTPS_PORT", DEFAULT_WEBAPP_HTTPS_PORT)?;
        if http_port == https_port {
            return Err(ConfigError::InvalidValue {
                key: "WEBAPP_HTTPS_PORT",
                value: https_port.to_string(),
                reason: "must differ from WEBAPP_HTTP_PORT".to_string(),
            });
        }

        let path_or = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        Ok(Self {
            http_port,
            https_port,
            static_dir: path_or("WEBAPP_STATIC_DIR", "public"),
            cert_path: path_or("WEBAPP_TLS_CERT", "certs/server.crt"),
            key_path: path_or("WEBAPP_TLS_KEY", "certs/server.key"),
            self_signed: flag_or(&lookup, "WEBAPP_SELF_SIGNED", true)?,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
