//! Versioned envelope encryption for PII fields.
//!
//! - [`keyring`]: the current key, retired keys, and the envelope policy.
//! - [`crypto`]: the AES-256-GCM primitive.
//! - [`codec`]: the `version:kid:iv.tag.ciphertext` envelope and [`CryptoService`].
//! - [`records`]: field-level encryption of ride-request and contact-form records.
//!
//! ```no_run
//! use envelope::{CryptoService, KeyRegistry};
//!
//! let registry = KeyRegistry::from_keyset_file("./secrets/crypto-keys.json")?;
//! let crypto = CryptoService::new(registry);
//! let sealed = crypto.encrypt("555-0100", Some("ride_requests"))?;
//! assert_eq!(crypto.decrypt(&sealed, Some("ride_requests"))?, "555-0100");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod crypto;
pub mod error;
pub mod keyring;
pub mod records;

pub use codec::{CryptoService, Envelope};
pub use error::{CryptoError, KeyringError};
pub use keyring::{KeyEntry, KeyRegistry, KeySource};
pub use records::{
    BatchDecrypt, ContactFormData, ContactFormDocument, FieldCipher, RecordFailure,
    RideRequestData, RideRequestDocument, RideRequestStatus,
};
