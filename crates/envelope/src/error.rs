//! Error types for key loading and envelope operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::KEY_LEN;

/// Errors raised while building the key registry.
///
/// All of these are fatal at startup: a process without a valid keyring cannot
/// serve requests.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// The keyset file could not be read.
    #[error("failed to read keyset file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The keyset file is not valid JSON or does not match the keyset schema.
    #[error("keyset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A key is not valid base64.
    #[error("key \"{kid}\" is not valid base64")]
    InvalidBase64 { kid: String },

    /// A key decoded to the wrong number of bytes.
    #[error("key \"{kid}\" must decode to {KEY_LEN} bytes (AES-256 key), got {len}")]
    InvalidKeyLength { kid: String, len: usize },

    /// A kid or version tag is empty or contains the `:` delimiter.
    #[error("invalid {field} {value:?}: must be non-empty and must not contain ':'")]
    InvalidIdentifier { field: &'static str, value: String },

    /// Two keys share the same kid.
    #[error("duplicate key id \"{0}\"")]
    DuplicateKid(String),
}

/// Errors returned by [`CryptoService`](crate::CryptoService) operations.
///
/// Every variant is recoverable at the request level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The registry requires AAD and none was supplied.
    #[error("AAD required by policy")]
    AadRequired,

    /// The envelope string does not have the `version:kid:iv.tag.ciphertext` shape.
    #[error("malformed envelope")]
    MalformedEnvelope,

    /// The envelope was written under a different format version.
    #[error("unsupported envelope version {found:?}")]
    UnsupportedVersion { found: String },

    /// The envelope names a kid that is not in the registry.
    #[error("unknown key id {0:?}")]
    UnknownKey(String),

    /// GCM tag verification failed: wrong key, tampered data, or AAD mismatch.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The authenticated plaintext is not valid UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// The AEAD primitive refused to encrypt.
    #[error("encryption failed")]
    EncryptionFailed,
}

impl CryptoError {
    /// Returns `true` when the failure is caused by caller-supplied data or
    /// policy rather than by the service itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CryptoError::EncryptionFailed)
    }

    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CryptoError::AadRequired => "aad_required",
            CryptoError::MalformedEnvelope => "malformed_envelope",
            CryptoError::UnsupportedVersion { .. } => "unsupported_version",
            CryptoError::UnknownKey(_) => "unknown_key",
            CryptoError::AuthenticationFailed => "authentication_failed",
            CryptoError::InvalidUtf8 => "invalid_utf8",
            CryptoError::EncryptionFailed => "encryption_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_encryption_failure_is_server_side() {
        assert!(CryptoError::AadRequired.is_client_error());
        assert!(CryptoError::MalformedEnvelope.is_client_error());
        assert!(CryptoError::AuthenticationFailed.is_client_error());
        assert!(CryptoError::UnknownKey("k9".into()).is_client_error());
        assert!(!CryptoError::EncryptionFailed.is_client_error());
    }

    #[test]
    fn key_length_message_names_kid() {
        let e = KeyringError::InvalidKeyLength {
            kid: "k2".into(),
            len: 16,
        };
        let msg = e.to_string();
        assert!(msg.contains("k2"));
        assert!(msg.contains("32"));
        assert!(msg.contains("16"));
    }
}
