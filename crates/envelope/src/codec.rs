//! Envelope Codec: the `version:kid:iv.tag.ciphertext` string format and the
//! [`CryptoService`] that produces and consumes it.
//!
//! # Envelope format
//!
//! ```text
//! <version>:<kid>:<base64(iv)>.<base64(tag)>.<base64(ciphertext)>
//! ```
//!
//! Standard base64 alphabet with padding. The IV is 12 bytes and the tag 16
//! bytes; the ciphertext has the plaintext's length and is empty for an empty
//! plaintext.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, CipherError, SealedField, IV_LEN, TAG_LEN};
use crate::error::CryptoError;
use crate::keyring::KeyRegistry;

/// A parsed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: String,
    kid: String,
    sealed: SealedField,
}

impl Envelope {
    /// Format tag the envelope was written under.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Id of the key that sealed the envelope.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Nonce, tag and ciphertext.
    pub fn sealed(&self) -> &SealedField {
        &self.sealed
    }

    /// Parse an envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] on a wrong segment count, an
    /// empty version, kid, IV or tag segment, invalid base64, or an IV/tag of
    /// the wrong length.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let mut header = s.split(':');
        let (version, kid, body) =
            match (header.next(), header.next(), header.next(), header.next()) {
                (Some(v), Some(k), Some(b), None)
                    if !v.is_empty() && !k.is_empty() && !b.is_empty() =>
                {
                    (v, k, b)
                }
                _ => return Err(CryptoError::MalformedEnvelope),
            };

        let mut segments = body.split('.');
        let (iv_b64, tag_b64, ct_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(i), Some(t), Some(c), None) if !i.is_empty() && !t.is_empty() => (i, t, c),
                _ => return Err(CryptoError::MalformedEnvelope),
            };

        let iv = decode_fixed::<IV_LEN>(iv_b64)?;
        let tag = decode_fixed::<TAG_LEN>(tag_b64)?;
        let ciphertext = STANDARD
            .decode(ct_b64)
            .map_err(|_| CryptoError::MalformedEnvelope)?;

        Ok(Self {
            version: version.to_owned(),
            kid: kid.to_owned(),
            sealed: SealedField {
                iv,
                tag,
                ciphertext,
            },
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}.{}",
            self.version,
            self.kid,
            STANDARD.encode(self.sealed.iv),
            STANDARD.encode(self.sealed.tag),
            STANDARD.encode(&self.sealed.ciphertext),
        )
    }
}

impl FromStr for Envelope {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn decode_fixed<const N: usize>(segment: &str) -> Result<[u8; N], CryptoError> {
    let bytes = STANDARD
        .decode(segment)
        .map_err(|_| CryptoError::MalformedEnvelope)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedEnvelope)
}

/// Authenticated encryption of field values under the registry's keys.
///
/// Cheap to clone: the registry sits behind an `Arc` and is never mutated, so
/// one instance is built at startup and handed to every consumer.
#[derive(Debug, Clone)]
pub struct CryptoService {
    registry: Arc<KeyRegistry>,
}

impl CryptoService {
    /// Wrap a freshly loaded registry.
    pub fn new(registry: KeyRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry backing this service.
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Seal `plaintext` under the current key and return the envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AadRequired`] when the registry requires AAD and
    /// `aad` is absent or empty; no cryptographic work is done in that case.
    pub fn encrypt(
        &self,
        plaintext: impl AsRef<[u8]>,
        aad: Option<&str>,
    ) -> Result<String, CryptoError> {
        self.seal(plaintext.as_ref(), aad).map(|env| env.to_string())
    }

    /// Like [`CryptoService::encrypt`] but returns the parsed [`Envelope`].
    pub fn seal(&self, plaintext: &[u8], aad: Option<&str>) -> Result<Envelope, CryptoError> {
        let aad = self.checked_aad(aad)?;
        let current = self.registry.current();
        let sealed = crypto::seal(plaintext, current.key(), aad.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok(Envelope {
            version: self.registry.version().to_owned(),
            kid: current.kid().to_owned(),
            sealed,
        })
    }

    /// Open an envelope string and return the UTF-8 plaintext.
    ///
    /// # Errors
    ///
    /// See [`CryptoService::open`]; additionally [`CryptoError::InvalidUtf8`]
    /// if the authenticated plaintext is not text.
    pub fn decrypt(&self, envelope: &str, aad: Option<&str>) -> Result<String, CryptoError> {
        let bytes = Zeroizing::new(self.decrypt_bytes(envelope, aad)?);
        std::str::from_utf8(&bytes)
            .map(str::to_owned)
            .map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Open an envelope string and return the raw plaintext bytes.
    pub fn decrypt_bytes(&self, envelope: &str, aad: Option<&str>) -> Result<Vec<u8>, CryptoError> {
        let envelope = Envelope::parse(envelope)?;
        self.open(&envelope, aad)
    }

    /// Open a parsed envelope.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::UnsupportedVersion`] if the envelope's version differs
    ///   from the registry's.
    /// - [`CryptoError::UnknownKey`] if its kid is neither current nor retired.
    /// - [`CryptoError::AuthenticationFailed`] if the tag does not verify under
    ///   the resolved key and `aad`.
    pub fn open(&self, envelope: &Envelope, aad: Option<&str>) -> Result<Vec<u8>, CryptoError> {
        if envelope.version != self.registry.version() {
            debug!(found = %envelope.version, "envelope version rejected");
            return Err(CryptoError::UnsupportedVersion {
                found: envelope.version.clone(),
            });
        }
        let entry = self.registry.find_key(&envelope.kid).ok_or_else(|| {
            debug!(kid = %envelope.kid, "envelope names unknown key");
            CryptoError::UnknownKey(envelope.kid.clone())
        })?;

        let aad = aad.unwrap_or_default();
        crypto::open(&envelope.sealed, entry.key(), aad.as_bytes()).map_err(|e| {
            debug!(kid = %envelope.kid, "envelope authentication failed");
            match e {
                CipherError::AeadFailure | CipherError::InvalidKeyLength => {
                    CryptoError::AuthenticationFailed
                }
            }
        })
    }

    /// Decrypt with whichever key the envelope names and seal again under the
    /// current key. Used by out-of-band migration jobs after a rotation.
    pub fn reencrypt(&self, envelope: &str, aad: Option<&str>) -> Result<String, CryptoError> {
        let plaintext = Zeroizing::new(self.decrypt_bytes(envelope, aad)?);
        self.encrypt(plaintext.as_slice(), aad)
    }

    /// Whether an envelope was sealed under a key other than the current one.
    pub fn needs_rotation(&self, envelope: &str) -> Result<bool, CryptoError> {
        let envelope = Envelope::parse(envelope)?;
        Ok(envelope.kid != self.registry.current().kid())
    }

    fn checked_aad<'a>(&self, aad: Option<&'a str>) -> Result<&'a str, CryptoError> {
        let aad = aad.unwrap_or_default();
        if self.registry.require_aad() && aad.is_empty() {
            return Err(CryptoError::AadRequired);
        }
        Ok(aad)
    }
}
