//! AES-256-GCM field encryption primitives.
//!
//! This module knows nothing about key ids, versions or the envelope string
//! format. It seals and opens raw bytes under a single 32-byte key.

pub mod cipher;

pub use cipher::{open, seal, CipherError, SealedField, ALGORITHM, IV_LEN, KEY_LEN, TAG_LEN};
