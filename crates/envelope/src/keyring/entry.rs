//! [`KeyEntry`]: one identified AES-256 key held in the registry.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::KEY_LEN;
use crate::error::KeyringError;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Zeroized on drop; the key never moves out of its heap allocation.
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl KeyBytes {
    fn from_slice(kid: &str, bytes: &[u8]) -> Result<Self, KeyringError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyringError::InvalidKeyLength {
                kid: kid.to_owned(),
                len: bytes.len(),
            });
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }
}

impl Zeroize for KeyBytes {
    fn zeroize(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for KeyBytes {}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// A key id paired with its 32-byte secret. Immutable once built.
#[derive(Debug)]
pub struct KeyEntry {
    kid: String,
    key: KeyBytes,
}

impl KeyEntry {
    /// Build an entry from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::InvalidIdentifier`] for an empty kid or one
    /// containing `:`, and [`KeyringError::InvalidKeyLength`] unless `key` is
    /// exactly [`KEY_LEN`] bytes.
    pub fn new(kid: impl Into<String>, key: &[u8]) -> Result<Self, KeyringError> {
        let kid = kid.into();
        super::validate_identifier("kid", &kid)?;
        let key = KeyBytes::from_slice(&kid, key)?;
        Ok(Self { kid, key })
    }

    /// Build an entry from a standard-alphabet base64 key.
    ///
    /// Surrounding whitespace is ignored so keys pasted into files or
    /// environment variables with a trailing newline still load.
    pub fn from_base64(kid: impl Into<String>, key_base64: &str) -> Result<Self, KeyringError> {
        let kid = kid.into();
        let raw = STANDARD
            .decode(key_base64.trim())
            .map(Zeroizing::new)
            .map_err(|_| KeyringError::InvalidBase64 { kid: kid.clone() })?;
        Self::new(kid, &raw)
    }

    /// The key id written into envelopes sealed with this key.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key.0[..]
    }
}
