//! Axum router construction.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Every route except `/health` sits behind the API-key guard.
pub fn build(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/encrypt", post(handlers::encrypt))
        .route("/decrypt", post(handlers::decrypt))
        .route("/ride-requests/encrypt", post(handlers::encrypt_ride_request))
        .route("/ride-requests/decrypt", post(handlers::decrypt_ride_requests))
        .route("/contacts/encrypt", post(handlers::encrypt_contact))
        .route("/contacts/decrypt", post(handlers::decrypt_contacts))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    Router::new()
        .merge(guarded)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(CompressionLayer::new())
        .with_state(state)
}
