//! Static-file web app served over HTTPS
//!
//! ## Endpoints (HTTPS)
//! - POST /api - echoes the JSON body
//! - GET /api/sample - fixed message plus current timestamp
//! - GET /api/health - static healthy response
//! - everything else - static files from the configured directory
//!
//! The plain-HTTP listener only redirects (see `redirect`).

pub mod redirect;

pub use redirect::{https_location, redirect_router};

use crate::config::WebAppConfig;
use crate::server::{JsonPayload, ShutdownSignal};
use axum::{
    routing::{get, post},
    Json, Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Grace period for in-flight HTTPS requests on shutdown
pub const HTTPS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Message returned by `GET /api/sample`
pub const SAMPLE_MESSAGE: &str = "This is a sample GET response";

async fn api_echo(JsonPayload(body): JsonPayload) -> Json<Value> {
    Json(body)
}

async fn api_sample() -> Json<Value> {
    Json(json!({
        "message": SAMPLE_MESSAGE,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn api_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Build the HTTPS router: API routes plus static files as fallback
pub fn build_router(static_dir: &Path) -> Router {
    Router::new()
        .route("/api", post(api_echo))
        .route("/api/sample", get(api_sample))
        .route("/api/health", get(api_health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

/// Serve the HTTPS app on `addr` until `shutdown` fires
///
/// `handle` exposes the bound address (useful with port 0). A bind failure
/// is returned as the error.
pub async fn serve_https(
    addr: SocketAddr,
    app: Router,
    tls_config: Arc<rustls::ServerConfig>,
    handle: Handle,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let config = RustlsConfig::from_config(tls_config);

    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.recv().await;
        shutdown_handle.graceful_shutdown(Some(HTTPS_DRAIN_TIMEOUT));
    });

    // Log after successful bind; `listening` yields None if binding fails
    let bind_handle = handle.clone();
    tokio::spawn(async move {
        if let Some(addr) = bind_handle.listening().await {
            info!(%addr, "HTTPS server listening");
        }
    });

    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

/// Serve the redirect-only HTTP listener until `shutdown` fires
pub async fn serve_redirect(
    listener: TcpListener,
    https_port: u16,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    axum::serve(listener, redirect_router(https_port))
        .with_graceful_shutdown(shutdown.recv())
        .await
}

/// Run both listeners on `0.0.0.0`
///
/// Returns when both have stopped, or as soon as either fails.
pub async fn run_webapp(
    config: &WebAppConfig,
    tls_config: Arc<rustls::ServerConfig>,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let https_addr = SocketAddr::from(([0, 0, 0, 0], config.https_port));

    let listener = TcpListener::bind(http_addr).await?;
    info!(
        port = %config.http_port,
        https_port = %config.https_port,
        "HTTP server listening (redirecting to HTTPS)"
    );

    info!(static_dir = %config.static_dir.display(), "Serving static files");

    let app = build_router(&config.static_dir);
    tokio::try_join!(
        serve_redirect(listener, config.https_port, shutdown.clone()),
        serve_https(https_addr, app, tls_config, Handle::new(), shutdown),
    )?;

    Ok(())
}

#[cfg(test)]
#[path = "webapp_test.rs"]
mod tests;
