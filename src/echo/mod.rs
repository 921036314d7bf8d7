//! Toy echo service, the kind of target the aggregator probes
//!
//! - `GET /healthz` - `{"status": "healthy", "service": <name>}`
//! - `POST /echo` - `{"service": <name>, "echo": <request body>}`

use crate::config::EchoConfig;
use crate::server::{JsonPayload, ShutdownSignal};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct EchoState {
    service: Arc<str>,
}

async fn healthz(State(state): State<EchoState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": &*state.service,
    }))
}

async fn echo(State(state): State<EchoState>, JsonPayload(body): JsonPayload) -> Json<Value> {
    Json(json!({
        "service": &*state.service,
        "echo": body,
    }))
}

/// Build the echo service router for `service_name`
pub fn build_router(service_name: &str) -> Router {
    let state = EchoState {
        service: Arc::from(service_name),
    };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/echo", post(echo))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the echo service on an already-bound listener until `shutdown` fires
pub async fn serve_echo(
    listener: TcpListener,
    service_name: &str,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(service_name))
        .with_graceful_shutdown(shutdown.recv())
        .await
}

/// Run the echo service on `0.0.0.0:<port>`
pub async fn run_echo_server(
    config: &EchoConfig,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(
        port = %config.port,
        service = %config.service_name,
        "Echo service listening (HTTP)"
    );

    serve_echo(listener, &config.service_name, shutdown).await
}

#[cfg(test)]
#[path = "echo_test.rs"]
mod tests;
