//! Axum middleware applied to the router.
//!
//! Includes the API-key guard and request-id propagation. Tracing, timeout
//! enforcement and compression come from `tower-http` in [`super::router`].

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use sha2::{Digest, Sha256};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{error::ApiError, state::AppState};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the shared API secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header echoing the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The expected API key, held only as its SHA-256 digest.
///
/// Presented keys are hashed before comparison so the comparison time does not
/// depend on how many leading bytes of the secret match.
pub struct ApiKey {
    digest: [u8; 32],
}

impl ApiKey {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    pub fn matches(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        presented
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Reject requests without a matching `x-api-key` header with `403`.
///
/// A no-op when no API key is configured.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    match presented {
        Some(key) if expected.matches(key) => next.run(req).await,
        _ => ApiError(ServiceError::Forbidden("invalid API key".into())).into_response(),
    }
}

/// Run the request inside a span tagged with a correlation id and echo the id
/// back in `x-request-id`.
///
/// An inbound id is reused only when it is a well-formed UUID.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4);

    let span = info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut resp = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}
