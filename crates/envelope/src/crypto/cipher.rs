//! AES-256-GCM sealing and opening of individual field values.
//!
//! **Nonce discipline:** GCM nonce reuse under one key is catastrophic: it
//! breaks both confidentiality and authentication. Every call to [`seal`]
//! draws a fresh 96-bit nonce from the OS CSPRNG; there is no API for
//! supplying a caller-chosen nonce.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Nonce, Tag,
};
use thiserror::Error;
use zeroize::Zeroizing;

/// Algorithm identity. Fixed per deployment; not negotiable per call.
pub const ALGORITHM: &str = "aes-256-gcm";

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a GCM nonce (12 bytes = 96 bits).
pub const IV_LEN: usize = 12;

/// Byte length of a GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Output of one AES-256-GCM sealing operation with the tag kept detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedField {
    /// Random nonce used for this field.
    pub iv: [u8; IV_LEN],
    /// Authentication tag over ciphertext and AAD.
    pub tag: [u8; TAG_LEN],
    /// Raw ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// AES-GCM encryption failed or the tag did not verify.
    #[error("aead operation failed")]
    AeadFailure,
}

/// Encrypt `plaintext` under `key`, binding `aad` as associated data.
///
/// An empty `aad` is the same as no associated data.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::AeadFailure`] on an internal AEAD error (should be unreachable
/// with a valid key and nonce).
pub fn seal(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<SealedField, CipherError> {
    let cipher = build_cipher(key)?;

    use aes_gcm::aead::rand_core::RngCore;
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
        .map_err(|_| CipherError::AeadFailure)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedField {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Verify and decrypt a [`SealedField`] back to plaintext bytes.
///
/// On tag mismatch the working buffer, which already holds keystream output,
/// is zeroized when it drops; no unauthenticated plaintext leaves this function.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key, wrong AAD
/// or tampered data).
pub fn open(field: &SealedField, key: &[u8], aad: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    let mut buffer = Zeroizing::new(field.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&field.iv),
            aad,
            buffer.as_mut_slice(),
            Tag::from_slice(&field.tag),
        )
        .map_err(|_| CipherError::AeadFailure)?;
    Ok(std::mem::take(&mut *buffer))
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)
}
