//! HTTP plumbing shared by the binaries
//!
//! - `health` - the aggregator's `/health`, `/healthz`, `/readyz`, `/metrics`
//! - `tls` - certificate loading/generation and the pinned rustls config
//! - `shutdown` - SIGTERM/SIGINT handling for graceful shutdown
//! - `body` - arbitrary-JSON request bodies for echo endpoints

pub mod body;
mod health;
pub mod shutdown;
pub mod tls;

pub use body::{BodyRejection, JsonPayload};
pub use health::{
    build_router, run_aggregator_server, serve_aggregator, ReadinessState, ServerState,
};
pub use shutdown::{
    shutdown_channel, shutdown_on_signal, wait_for_signal, ShutdownController, ShutdownSignal,
    TerminationSignal,
};
pub use tls::{build_rustls_config, initialize_tls, CertificateBundle, TlsError};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;

#[cfg(test)]
#[path = "tls_test.rs"]
mod tls_tests;
