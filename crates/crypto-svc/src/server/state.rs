//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Duration;

use envelope::CryptoService;

use super::middleware::{ApiKey, REQUEST_TIMEOUT};

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable so that Axum can clone the state for each
/// request without copying key material.
#[derive(Clone)]
pub struct AppState {
    /// Envelope codec backed by the immutable key registry.
    pub crypto: CryptoService,
    /// Expected `x-api-key` value; `None` leaves the API open.
    pub api_key: Option<Arc<ApiKey>>,
    /// Per-request timeout applied by the router.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create a new [`AppState`] with the default request timeout.
    pub fn new(crypto: CryptoService, api_key: Option<&str>) -> Self {
        Self {
            crypto,
            api_key: api_key.map(|k| Arc::new(ApiKey::new(k))),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
