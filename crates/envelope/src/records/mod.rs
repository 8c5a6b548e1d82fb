//! Record Transformers: field-level encryption of the two stored record shapes.
//!
//! Each transformer applies the codec to a fixed list of sensitive fields and
//! copies every other field unchanged. Decrypting a record is all-or-nothing:
//! one field that fails to open fails the record.
//!
//! Batch decryption comes in two flavours:
//! - `decrypt_*s` is fail-closed: the first bad record rejects the batch.
//! - `decrypt_*s_partial` keeps the records that open and reports the rest as
//!   [`RecordFailure`]s, for list pages that must not be hidden by one corrupt
//!   or foreign record.

pub mod contact;
pub mod ride_request;

pub use contact::{
    decrypt_contact, decrypt_contacts, decrypt_contacts_partial, encrypt_contact, ContactFormData,
    ContactFormDocument, CONTACT_SENSITIVE_FIELDS,
};
pub use ride_request::{
    decrypt_ride_request, decrypt_ride_requests, decrypt_ride_requests_partial,
    encrypt_ride_request, RideRequestData, RideRequestDocument, RideRequestStatus,
    RIDE_REQUEST_SENSITIVE_FIELDS,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::CryptoService;
use crate::error::CryptoError;

/// The seam between record shapes and the envelope codec.
///
/// `aad` is passed as a plain string; the empty string means no AAD.
#[cfg_attr(test, mockall::automock)]
pub trait FieldCipher {
    /// Seal one field value.
    fn encrypt_field(&self, plaintext: &str, aad: &str) -> Result<String, CryptoError>;

    /// Open one field value.
    fn decrypt_field(&self, envelope: &str, aad: &str) -> Result<String, CryptoError>;
}

impl FieldCipher for CryptoService {
    fn encrypt_field(&self, plaintext: &str, aad: &str) -> Result<String, CryptoError> {
        self.encrypt(plaintext, Some(aad))
    }

    fn decrypt_field(&self, envelope: &str, aad: &str) -> Result<String, CryptoError> {
        self.decrypt(envelope, Some(aad))
    }
}

/// Delivery bookkeeping written next to a stored form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTracking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_failed_at: Option<String>,
}

/// A record that could not be decrypted in a partial batch.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the input slice.
    pub index: usize,
    /// Document id of the record.
    pub id: String,
    pub error: CryptoError,
}

/// Outcome of a partial batch decrypt.
#[derive(Debug, PartialEq, Eq)]
pub struct BatchDecrypt<T> {
    /// Successfully decrypted records, in input order.
    pub records: Vec<T>,
    pub failures: Vec<RecordFailure>,
}

impl<T> BatchDecrypt<T> {
    /// Whether every record decrypted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub(crate) fn decrypt_partial<T>(
    docs: &[T],
    id_of: impl Fn(&T) -> &str,
    mut decrypt_one: impl FnMut(&T) -> Result<T, CryptoError>,
) -> BatchDecrypt<T> {
    let mut out = BatchDecrypt {
        records: Vec::with_capacity(docs.len()),
        failures: Vec::new(),
    };
    for (index, doc) in docs.iter().enumerate() {
        match decrypt_one(doc) {
            Ok(record) => out.records.push(record),
            Err(error) => {
                let id = id_of(doc).to_owned();
                warn!(index, id = %id, error = %error, "record decryption failed; skipped");
                out.failures.push(RecordFailure { index, id, error });
            }
        }
    }
    out
}

impl CryptoService {
    /// See [`ride_request::encrypt_ride_request`].
    pub fn encrypt_ride_request(
        &self,
        data: &RideRequestData,
        aad: Option<&str>,
    ) -> Result<RideRequestData, CryptoError> {
        encrypt_ride_request(self, data, aad)
    }

    /// See [`ride_request::decrypt_ride_request`].
    pub fn decrypt_ride_request(
        &self,
        doc: &RideRequestDocument,
        aad: Option<&str>,
    ) -> Result<RideRequestDocument, CryptoError> {
        decrypt_ride_request(self, doc, aad)
    }

    /// See [`ride_request::decrypt_ride_requests`].
    pub fn decrypt_ride_requests(
        &self,
        docs: &[RideRequestDocument],
        aad: Option<&str>,
    ) -> Result<Vec<RideRequestDocument>, CryptoError> {
        decrypt_ride_requests(self, docs, aad)
    }

    /// See [`ride_request::decrypt_ride_requests_partial`].
    pub fn decrypt_ride_requests_partial(
        &self,
        docs: &[RideRequestDocument],
        aad: Option<&str>,
    ) -> BatchDecrypt<RideRequestDocument> {
        decrypt_ride_requests_partial(self, docs, aad)
    }

    /// See [`contact::encrypt_contact`].
    pub fn encrypt_contact(
        &self,
        data: &ContactFormData,
        aad: Option<&str>,
    ) -> Result<ContactFormData, CryptoError> {
        encrypt_contact(self, data, aad)
    }

    /// See [`contact::decrypt_contact`].
    pub fn decrypt_contact(
        &self,
        doc: &ContactFormDocument,
        aad: Option<&str>,
    ) -> Result<ContactFormDocument, CryptoError> {
        decrypt_contact(self, doc, aad)
    }

    /// See [`contact::decrypt_contacts`].
    pub fn decrypt_contacts(
        &self,
        docs: &[ContactFormDocument],
        aad: Option<&str>,
    ) -> Result<Vec<ContactFormDocument>, CryptoError> {
        decrypt_contacts(self, docs, aad)
    }

    /// See [`contact::decrypt_contacts_partial`].
    pub fn decrypt_contacts_partial(
        &self,
        docs: &[ContactFormDocument],
        aad: Option<&str>,
    ) -> BatchDecrypt<ContactFormDocument> {
        decrypt_contacts_partial(self, docs, aad)
    }
}
