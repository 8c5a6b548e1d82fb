//! Request and response types exchanged over the HTTP API.
//!
//! Record payloads are generic so this crate stays free of the crypto crate;
//! the service instantiates them with the concrete record shapes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw encrypt / decrypt endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// UTF-8 text to seal into an envelope.
    pub plaintext: String,
    /// Optional associated data bound to the envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub success: bool,
    /// `<version>:<kid>:<iv>.<tag>.<ciphertext>` envelope string.
    pub envelope: String,
    pub message: String,
}

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    pub envelope: String,
    /// Must match the AAD supplied at encryption time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
}

/// Successful response body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub success: bool,
    pub plaintext: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Record endpoints
// ---------------------------------------------------------------------------

/// Request body for the record encrypt endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRequest<T> {
    pub record: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
}

/// Response body for the record encrypt endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse<T> {
    pub record: T,
}

/// How a batch decrypt reacts to a record that cannot be opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// The first failing record rejects the whole batch.
    #[default]
    FailClosed,
    /// Failing records are dropped from `records` and reported in `failures`.
    Partial,
}

/// Request body for the record batch decrypt endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDecryptRequest<T> {
    pub records: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
    #[serde(default)]
    pub mode: BatchMode,
}

/// One record that could not be decrypted in partial mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Position of the record in the request batch.
    pub index: usize,
    /// Document id of the failing record.
    pub id: String,
    pub code: String,
    pub message: String,
}

/// Response body for the record batch decrypt endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDecryptResponse<T> {
    pub records: Vec<T>,
    #[serde(default)]
    pub failures: Vec<RecordFailure>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status, always `"ok"` once the process is serving.
    pub status: String,
    /// Envelope format tag the service writes and accepts.
    pub version: String,
    /// Key id used for new envelopes.
    pub current_kid: String,
    /// Number of keys (current + retired) available for decryption.
    pub keys_loaded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encrypt_request_aad_is_optional() {
        let req: EncryptRequest = serde_json::from_value(json!({"plaintext": "hello"})).unwrap();
        assert_eq!(req.plaintext, "hello");
        assert!(req.aad.is_none());
    }

    #[test]
    fn encrypt_request_rejects_non_string_plaintext() {
        let res = serde_json::from_value::<EncryptRequest>(json!({"plaintext": 42}));
        assert!(res.is_err());
    }

    #[test]
    fn batch_mode_defaults_to_fail_closed() {
        let req: BatchDecryptRequest<serde_json::Value> =
            serde_json::from_value(json!({"records": []})).unwrap();
        assert_eq!(req.mode, BatchMode::FailClosed);

        let req: BatchDecryptRequest<serde_json::Value> =
            serde_json::from_value(json!({"records": [], "mode": "partial"})).unwrap();
        assert_eq!(req.mode, BatchMode::Partial);
    }

    #[test]
    fn error_response_from_service_error() {
        let e = ErrorResponse::from(&crate::ServiceError::BadRequest("AAD required".into()));
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("AAD required"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            version: "v1".into(),
            current_kid: "k2".into(),
            keys_loaded: 2,
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.keys_loaded, 2);
        assert_eq!(decoded.current_kid, "k2");
    }
}
