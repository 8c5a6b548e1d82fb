//! Mapping from crate errors to HTTP error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};
use envelope::CryptoError;
use tracing::{error, warn};

/// A [`ServiceError`] that renders as `{code, message}` with its status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        let msg = err.to_string();
        Self(match err {
            CryptoError::AadRequired => ServiceError::BadRequest(msg),
            CryptoError::EncryptionFailed => ServiceError::EncryptionFailure(msg),
            CryptoError::MalformedEnvelope
            | CryptoError::UnsupportedVersion { .. }
            | CryptoError::UnknownKey(_)
            | CryptoError::AuthenticationFailed
            | CryptoError::InvalidUtf8 => ServiceError::DecryptionRejected(msg),
        })
    }
}

/// Rejections get a fixed message per kind: serde's own text can quote the
/// offending request value.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = match rejection {
            JsonRejection::JsonDataError(_) => "request body does not match the expected shape",
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => {
                "expected request with `Content-Type: application/json`"
            }
            JsonRejection::BytesRejection(_) => "failed to read request body",
            _ => "invalid JSON request body",
        };
        Self(ServiceError::BadRequest(msg.into()))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.code(), "request failed");
        } else {
            warn!(code = self.0.code(), status = status.as_u16(), "request rejected");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CryptoError) -> u16 {
        ApiError::from(err).0.http_status()
    }

    #[test]
    fn decrypt_data_errors_are_client_errors() {
        assert_eq!(status_of(CryptoError::MalformedEnvelope), 400);
        assert_eq!(
            status_of(CryptoError::UnsupportedVersion { found: "v9".into() }),
            400
        );
        assert_eq!(status_of(CryptoError::UnknownKey("k9".into())), 400);
        assert_eq!(status_of(CryptoError::AuthenticationFailed), 400);
        assert_eq!(status_of(CryptoError::InvalidUtf8), 400);
    }

    #[test]
    fn policy_and_encryption_failures() {
        assert_eq!(status_of(CryptoError::AadRequired), 400);
        assert_eq!(status_of(CryptoError::EncryptionFailed), 500);
    }

    #[test]
    fn decrypt_failures_use_decryption_code() {
        let err = ApiError::from(CryptoError::AuthenticationFailed);
        assert_eq!(err.0.code(), "decryption_failed");
        assert_eq!(err.0.message(), "authentication failed");
    }
}
