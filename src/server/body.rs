//! Arbitrary-JSON request bodies for the echo endpoints
//!
//! Unlike `axum::Json`, no `Content-Type` is required; the raw body just has
//! to parse as JSON. Failures map to `400` with a small JSON error.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Any JSON value read from the request body
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPayload(pub Value);

/// Why a body was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRejection {
    Unreadable,
    InvalidJson,
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let message = match self {
            BodyRejection::Unreadable => "Error reading body",
            BodyRejection::InvalidJson => "Invalid JSON",
        };
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
    }
}

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| BodyRejection::Unreadable)?;

        serde_json::from_slice(&bytes)
            .map(JsonPayload)
            .map_err(|_| BodyRejection::InvalidJson)
    }
}
