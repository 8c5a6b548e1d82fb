//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    BatchDecryptRequest, BatchDecryptResponse, BatchMode, DecryptRequest, DecryptResponse,
    EncryptRequest, EncryptResponse, ErrorResponse, HealthResponse, RecordFailure, RecordRequest,
    RecordResponse,
};
use envelope::{
    BatchDecrypt, ContactFormData, ContactFormDocument, RideRequestData, RideRequestDocument,
};
use tracing::debug;

use super::{error::ApiError, state::AppState};

/// `POST /encrypt` — seal one plaintext string under the current key.
pub async fn encrypt(
    State(state): State<AppState>,
    payload: Result<Json<EncryptRequest>, JsonRejection>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let Json(req) = payload?;
    let envelope = state.crypto.encrypt(&req.plaintext, req.aad.as_deref())?;
    debug!(kid = state.crypto.registry().current().kid(), "plaintext sealed");
    Ok(Json(EncryptResponse {
        success: true,
        envelope,
        message: "Successfully encrypted plaintext.".into(),
    }))
}

/// `POST /decrypt` — open one envelope string.
///
/// Every data-caused failure (tampering, wrong AAD, unknown kid, foreign
/// version, malformed input) is a `400`.
pub async fn decrypt(
    State(state): State<AppState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let Json(req) = payload?;
    let plaintext = state.crypto.decrypt(&req.envelope, req.aad.as_deref())?;
    Ok(Json(DecryptResponse {
        success: true,
        plaintext,
        message: "Successfully decrypted envelope.".into(),
    }))
}

/// `POST /ride-requests/encrypt`
pub async fn encrypt_ride_request(
    State(state): State<AppState>,
    payload: Result<Json<RecordRequest<RideRequestData>>, JsonRejection>,
) -> Result<Json<RecordResponse<RideRequestData>>, ApiError> {
    let Json(req) = payload?;
    let record = state
        .crypto
        .encrypt_ride_request(&req.record, req.aad.as_deref())?;
    Ok(Json(RecordResponse { record }))
}

/// `POST /ride-requests/decrypt`
pub async fn decrypt_ride_requests(
    State(state): State<AppState>,
    payload: Result<Json<BatchDecryptRequest<RideRequestDocument>>, JsonRejection>,
) -> Result<Json<BatchDecryptResponse<RideRequestDocument>>, ApiError> {
    let Json(req) = payload?;
    let aad = req.aad.as_deref();
    let resp = match req.mode {
        BatchMode::FailClosed => BatchDecryptResponse {
            records: state.crypto.decrypt_ride_requests(&req.records, aad)?,
            failures: Vec::new(),
        },
        BatchMode::Partial => into_response_body(
            state.crypto.decrypt_ride_requests_partial(&req.records, aad),
        ),
    };
    Ok(Json(resp))
}

/// `POST /contacts/encrypt`
pub async fn encrypt_contact(
    State(state): State<AppState>,
    payload: Result<Json<RecordRequest<ContactFormData>>, JsonRejection>,
) -> Result<Json<RecordResponse<ContactFormData>>, ApiError> {
    let Json(req) = payload?;
    let record = state.crypto.encrypt_contact(&req.record, req.aad.as_deref())?;
    Ok(Json(RecordResponse { record }))
}

/// `POST /contacts/decrypt`
pub async fn decrypt_contacts(
    State(state): State<AppState>,
    payload: Result<Json<BatchDecryptRequest<ContactFormDocument>>, JsonRejection>,
) -> Result<Json<BatchDecryptResponse<ContactFormDocument>>, ApiError> {
    let Json(req) = payload?;
    let aad = req.aad.as_deref();
    let resp = match req.mode {
        BatchMode::FailClosed => BatchDecryptResponse {
            records: state.crypto.decrypt_contacts(&req.records, aad)?,
            failures: Vec::new(),
        },
        BatchMode::Partial => {
            into_response_body(state.crypto.decrypt_contacts_partial(&req.records, aad))
        }
    };
    Ok(Json(resp))
}

fn into_response_body<T>(batch: BatchDecrypt<T>) -> BatchDecryptResponse<T> {
    let failures = batch
        .failures
        .into_iter()
        .map(|f| RecordFailure {
            index: f.index,
            id: f.id,
            code: f.error.kind().into(),
            message: f.error.to_string(),
        })
        .collect();
    BatchDecryptResponse {
        records: batch.records,
        failures,
    }
}

/// `GET /health` — liveness check.
///
/// The registry is loaded before the listener binds, so a serving process is
/// always ready.
pub async fn health(State(state): State<AppState>) -> Response {
    let registry = state.crypto.registry();
    let body = HealthResponse {
        status: "ok".into(),
        version: registry.version().into(),
        current_kid: registry.current().kid().into(),
        keys_loaded: registry.len(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
