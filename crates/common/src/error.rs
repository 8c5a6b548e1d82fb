//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::DecryptionRejected`] → 400
/// - [`ServiceError::Forbidden`] → 403
/// - [`ServiceError::EncryptionFailure`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or violated the AAD policy.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An envelope could not be opened: tampered, malformed, foreign version or
    /// unknown key. Data errors, not server faults.
    #[error("decryption rejected: {0}")]
    DecryptionRejected(String),

    /// The caller did not present a valid API key.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Encryption failed inside the crypto layer.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::DecryptionRejected(_) => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::EncryptionFailure(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the `code` field of error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::DecryptionRejected(_) => "decryption_failed",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::EncryptionFailure(_) => "encryption_failed",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// The caller-safe message carried by the variant.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::BadRequest(m)
            | ServiceError::DecryptionRejected(m)
            | ServiceError::Forbidden(m)
            | ServiceError::EncryptionFailure(m)
            | ServiceError::Internal(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(
            ServiceError::DecryptionRejected("x".into()).http_status(),
            400
        );
        assert_eq!(ServiceError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(
            ServiceError::EncryptionFailure("x".into()).http_status(),
            500
        );
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::BadRequest("x".into()).code(), "bad_request");
        assert_eq!(
            ServiceError::DecryptionRejected("x".into()).code(),
            "decryption_failed"
        );
        assert_eq!(ServiceError::Internal("x".into()).code(), "internal_error");
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::DecryptionRejected("authentication failed".into());
        assert!(e.to_string().contains("authentication failed"));
        assert_eq!(e.message(), "authentication failed");
    }
}
