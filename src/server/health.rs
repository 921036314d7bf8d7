//! Aggregator HTTP surface
//!
//! - `/health` - Fleet health: 200 all healthy, 503 any unhealthy, 500 on orchestration failure
//! - `/healthz` - Liveness: Is the aggregator process alive?
//! - `/readyz` - Readiness: 503 once shutdown has begun
//! - `/metrics` - Prometheus metrics in text format

use crate::aggregator::{Aggregator, SharedMetrics};
use crate::server::shutdown::ShutdownSignal;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state for readiness tracking
///
/// Set ready once the listener is bound; cleared when shutdown begins so
/// load balancers stop routing here.
#[derive(Debug, Clone)]
pub struct ReadinessState {
    ready: Arc<AtomicBool>,
}

impl ReadinessState {
    /// Create a new readiness state (initially not ready)
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the aggregator as ready to serve traffic
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Mark the aggregator as not ready
    ///
    /// Called on shutdown so load balancers stop routing to this instance
    /// while in-flight requests drain.
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    /// Check if the aggregator is ready
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined server state for the aggregator endpoints
#[derive(Clone)]
pub struct ServerState {
    aggregator: Arc<Aggregator>,
    readiness: ReadinessState,
    metrics: SharedMetrics,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        aggregator: Arc<Aggregator>,
        readiness: ReadinessState,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            aggregator,
            readiness,
            metrics,
        }
    }
}

/// Body of a `500` from `/health`
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

/// Aggregate fleet health handler
///
/// Status code alone carries the verdict; the body always lists every target.
async fn fleet_health(State(state): State<ServerState>) -> Response {
    match state.aggregator.check_health().await {
        Ok(report) => {
            let code = if report.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (code, Json(report)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Aggregate health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    status: "error",
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Liveness probe handler
async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe handler
async fn readyz(State(state): State<ServerState>) -> StatusCode {
    if state.readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Prometheus metrics handler
async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Build the aggregator router
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(fleet_health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(self::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the aggregator on an already-bound listener until `shutdown` fires
pub async fn serve_aggregator(
    listener: TcpListener,
    state: ServerState,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let readiness = state.readiness.clone();
    let app = build_router(state);

    readiness.set_ready();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.recv())
        .await
}

/// Run the aggregator on `0.0.0.0:port`
///
/// Runs until `shutdown` fires, then drains in-flight requests.
pub async fn run_aggregator_server(
    port: u16,
    state: ServerState,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "Health check aggregator listening (HTTP)");

    serve_aggregator(listener, state, shutdown).await
}
