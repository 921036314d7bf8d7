//! Tests for environment configuration parsing

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_aggregator_defaults() {
    let config = AggregatorConfig::from_lookup(lookup(&[])).unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.probe_timeout, Duration::from_secs(3));
    assert_eq!(config.targets.len(), 5);
}

#[test]
fn test_aggregator_custom_targets_keep_order() {
    let config = AggregatorConfig::from_lookup(lookup(&[
        ("FLEETCHECK_PORT", "9090"),
        (
            "FLEETCHECK_TARGETS",
            "zeta=http://10.0.0.1:81/healthz, alpha=http://10.0.0.2:82/healthz",
        ),
        ("FLEETCHECK_PROBE_TIMEOUT_MS", "250"),
    ]))
    .unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.probe_timeout, Duration::from_millis(250));
    let names = config
        .targets
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

#[test]
fn test_aggregator_empty_target_list_is_allowed() {
    let config = AggregatorConfig::from_lookup(lookup(&[("FLEETCHECK_TARGETS", "")])).unwrap();

    assert!(config.targets.is_empty());
}

#[test]
fn test_aggregator_rejects_malformed_target() {
    let err = AggregatorConfig::from_lookup(lookup(&[(
        "FLEETCHECK_TARGETS",
        "python=http://localhost:8081/healthz,golang",
    )]))
    .unwrap_err();

    assert_eq!(err, ConfigError::MalformedTarget("golang".into()));
}

#[test]
fn test_aggregator_rejects_duplicate_target() {
    let err = parse_targets("a=http://h:1/healthz,a=http://h:2/healthz").unwrap_err();

    assert_eq!(
        err,
        ConfigError::Target(TargetError::DuplicateName("a".into()))
    );
}

#[test]
fn test_aggregator_rejects_zero_timeout_and_bad_port() {
    assert!(matches!(
        AggregatorConfig::from_lookup(lookup(&[("FLEETCHECK_PROBE_TIMEOUT_MS", "0")])),
        Err(ConfigError::InvalidValue {
            key: "FLEETCHECK_PROBE_TIMEOUT_MS",
            ..
        })
    ));
    assert!(matches!(
        AggregatorConfig::from_lookup(lookup(&[("FLEETCHECK_PORT", "70000")])),
        Err(ConfigError::InvalidValue {
            key: "FLEETCHECK_PORT",
            ..
        })
    ));
}

#[test]
fn test_echo_defaults_and_overrides() {
    let defaults = EchoConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(
        defaults,
        EchoConfig {
            service_name: "rust".into(),
            port: 8086
        }
    );

    let custom = EchoConfig::from_lookup(lookup(&[
        ("ECHO_SERVICE_NAME", "python"),
        ("ECHO_PORT", "8081"),
    ]))
    .unwrap();
    assert_eq!(custom.service_name, "python");
    assert_eq!(custom.port, 8081);
}

#[test]
fn test_webapp_defaults() {
    let config = WebAppConfig::from_lookup(lookup(&[])).unwrap();

    assert_eq!(config.http_port, 8000);
    assert_eq!(config.https_port, 8443);
    assert_eq!(config.static_dir, PathBuf::from("public"));
    assert_eq!(config.cert_path, PathBuf::from("certs/server.crt"));
    assert_eq!(config.key_path, PathBuf::from("certs/server.key"));
    assert!(config.self_signed);
}

#[test]
fn test_webapp_rejects_same_ports_and_bad_flag() {
    assert!(WebAppConfig::from_lookup(lookup(&[
        ("WEBAPP_HTTP_PORT", "9000"),
        ("WEBAPP_HTTPS_PORT", "9000"),
    ]))
    .is_err());

    assert!(matches!(
        WebAppConfig::from_lookup(lookup(&[("WEBAPP_SELF_SIGNED", "maybe")])),
        Err(ConfigError::InvalidValue {
            key: "WEBAPP_SELF_SIGNED",
            ..
        })
    ));

    let off = WebAppConfig::from_lookup(lookup(&[("WEBAPP_SELF_SIGNED", "0")])).unwrap();
    assert!(!off.self_signed);
}
