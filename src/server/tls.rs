//! TLS setup for the web app's HTTPS listener
//!
//! Certificates come from PEM files on disk. When the files are missing and
//! self-signed mode is on, a CA and a server certificate are generated at
//! startup and written back so restarts reuse them.
//!
//! ## Certificate Chain (self-signed mode)
//! ```text
//! Self-signed CA (fleetcheck-webapp-ca)
//!     └── Server cert (localhost, 127.0.0.1, ::1, extra hosts)
//! ```
//!
//! The rustls config is pinned: TLS 1.2 through 1.3 only, and TLS 1.2 is
//! restricted to four ECDHE AES-GCM suites.

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, SanType,
};
use rustls::crypto::CryptoProvider;
use rustls::{SupportedCipherSuite, SupportedProtocolVersion};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Validity period for the generated CA certificate (10 years)
pub const CA_VALIDITY_DAYS: u32 = 3650;

/// Validity period for the generated server certificate (1 year)
pub const SERVER_VALIDITY_DAYS: u32 = 365;

/// Host names every self-signed server certificate covers
pub const DEFAULT_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Minimum TLS 1.2, maximum TLS 1.3
pub static PINNED_PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// Errors that can occur during TLS setup
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Failed to generate certificate: {0}")]
    Generation(#[from] rcgen::Error),

    #[error("Failed to parse certificate: {0}")]
    Parse(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Certificate/key pair is incomplete, missing {0}")]
    IncompletePair(String),

    #[error("Invalid PEM data")]
    InvalidPem,
}

/// PEM-encoded server certificate chain and key
#[derive(Clone)]
pub struct CertificateBundle {
    /// PEM-encoded server certificate chain
    pub cert_pem: String,
    /// PEM-encoded server private key
    pub key_pem: String,
    /// PEM-encoded CA certificate, only for generated bundles
    pub ca_cert_pem: Option<String>,
}

/// Cipher suites allowed by the HTTPS listener
///
/// TLS 1.2: ECDHE-{ECDSA,RSA}-AES{128,256}-GCM only. TLS 1.3 suites are
/// all AEAD and kept as-is.
pub fn pinned_cipher_suites() -> Vec<SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite;

    vec![
        cipher_suite::TLS13_AES_256_GCM_SHA384,
        cipher_suite::TLS13_AES_128_GCM_SHA256,
        cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
        cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    ]
}

/// ring provider restricted to the pinned cipher suites
pub fn pinned_crypto_provider() -> CryptoProvider {
    CryptoProvider {
        cipher_suites: pinned_cipher_suites(),
        ..rustls::crypto::ring::default_provider()
    }
}

fn dns_name(name: &str) -> Result<SanType, TlsError> {
    Ok(SanType::DnsName(name.try_into().map_err(|e| {
        TlsError::Parse(format!("Invalid DNS name '{}': {}", name, e))
    })?))
}

/// Generate a self-signed CA certificate
fn generate_ca() -> Result<(Certificate, KeyPair), TlsError> {
    let mut params = CertificateParams::default();

    params
        .distinguished_name
        .push(DnType::CommonName, "fleetcheck-webapp-ca");
    params
        .distinguished_name
        .push(DnType::OrganizationName, "fleetcheck");

    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(CA_VALIDITY_DAYS as i64);

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    Ok((cert, key_pair))
}

/// Generate a server certificate for `hosts`, signed by the CA
///
/// Entries that parse as IP addresses become IP SANs, the rest DNS SANs.
fn generate_server_cert(
    ca_cert: &Certificate,
    ca_key: &KeyPair,
    hosts: &[String],
) -> Result<(String, String), TlsError> {
    let common_name = hosts.first().map(String::as_str).unwrap_or("localhost");

    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params
        .distinguished_name
        .push(DnType::OrganizationName, "fleetcheck");

    params.subject_alt_names = hosts
        .iter()
        .map(|host| match host.parse::<IpAddr>() {
            Ok(ip) => Ok(SanType::IpAddress(ip)),
            Err(_) => dns_name(host),
        })
        .collect::<Result<Vec<_>, _>>()?;

    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(SERVER_VALIDITY_DAYS as i64);

    let key_pair = KeyPair::generate()?;
    let cert = params.signed_by(&key_pair, ca_cert, ca_key)?;

    Ok((cert.pem(), key_pair.serialize_pem()))
}

/// Generate a CA plus a server certificate covering the default hosts and
/// `extra_hosts`
pub fn generate_self_signed(extra_hosts: &[&str]) -> Result<CertificateBundle, TlsError> {
    let mut hosts: Vec<String> = Vec::new();
    for host in DEFAULT_HOSTS.iter().chain(extra_hosts) {
        if !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    }

    let (ca_cert, ca_key) = generate_ca()?;
    let (cert_pem, key_pem) = generate_server_cert(&ca_cert, &ca_key, &hosts)?;

    Ok(CertificateBundle {
        cert_pem,
        key_pem,
        ca_cert_pem: Some(ca_cert.pem()),
    })
}

fn read_pem(path: &Path) -> Result<String, TlsError> {
    std::fs::read_to_string(path).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load a bundle from PEM files
///
/// Returns `Ok(None)` when neither file exists; one without the other is
/// an error.
pub fn load_from_files(
    cert_path: &Path,
    key_path: &Path,
) -> Result<Option<CertificateBundle>, TlsError> {
    match (cert_path.exists(), key_path.exists()) {
        (false, false) => Ok(None),
        (true, true) => Ok(Some(CertificateBundle {
            cert_pem: read_pem(cert_path)?,
            key_pem: read_pem(key_path)?,
            ca_cert_pem: None,
        })),
        (true, false) => Err(TlsError::IncompletePair(key_path.display().to_string())),
        (false, true) => Err(TlsError::IncompletePair(cert_path.display().to_string())),
    }
}

/// Write a bundle to PEM files, creating parent directories
pub fn save_to_files(
    bundle: &CertificateBundle,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(), TlsError> {
    for (path, contents) in [(cert_path, &bundle.cert_pem), (key_path, &bundle.key_pem)] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TlsError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, contents).map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Load the bundle from disk, or generate and persist one
///
/// 1. Both PEM files exist: use them
/// 2. Neither exists and `self_signed`: generate, try to save, use
/// 3. Otherwise: error
pub fn initialize_tls(
    cert_path: &Path,
    key_path: &Path,
    self_signed: bool,
) -> Result<CertificateBundle, TlsError> {
    if let Some(bundle) = load_from_files(cert_path, key_path)? {
        info!(cert = %cert_path.display(), "Loaded TLS certificate from disk");
        return Ok(bundle);
    }

    if !self_signed {
        return Err(TlsError::Io {
            path: cert_path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "certificate not found and self-signed generation disabled",
            ),
        });
    }

    info!("No TLS certificate found, generating a self-signed one");
    let bundle = generate_self_signed(&[])?;

    if let Err(e) = save_to_files(&bundle, cert_path, key_path) {
        warn!(error = %e, "Failed to persist generated certificate (continuing in memory)");
    } else {
        info!(cert = %cert_path.display(), "Saved generated TLS certificate");
    }

    Ok(bundle)
}

/// Build the pinned rustls ServerConfig from a bundle
pub fn build_rustls_config(
    bundle: &CertificateBundle,
) -> Result<Arc<rustls::ServerConfig>, TlsError> {
    use rustls::pki_types::CertificateDer;
    use rustls_pemfile::{certs, private_key};
    use std::io::BufReader;

    let cert_chain: Vec<CertificateDer<'static>> =
        certs(&mut BufReader::new(bundle.cert_pem.as_bytes()))
            .filter_map(|r| r.ok())
            .collect();

    if cert_chain.is_empty() {
        return Err(TlsError::InvalidPem);
    }

    let key = private_key(&mut BufReader::new(bundle.key_pem.as_bytes()))
        .map_err(|e| TlsError::Parse(format!("Failed to parse private key: {}", e)))?
        .ok_or(TlsError::InvalidPem)?;

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(pinned_crypto_provider()))
        .with_protocol_versions(PINNED_PROTOCOL_VERSIONS)
        .map_err(|e| TlsError::Parse(format!("Failed to set protocol versions: {}", e)))?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .map_err(|e| TlsError::Parse(format!("Failed to build TLS config: {}", e)))?;

    Ok(Arc::new(config))
}
