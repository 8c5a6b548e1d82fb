//! Contact-form records.
//!
//! Encrypted fields: `first_name`, `last_name`, `email`, `phone`. The phone
//! number is optional. A present-but-empty phone still goes through the codec
//! so the stored document never reveals whether a number was typed; an absent
//! phone stays absent.

use serde::{Deserialize, Serialize};

use super::{decrypt_partial, BatchDecrypt, EmailTracking, FieldCipher};
use crate::error::CryptoError;

/// Field names encrypted at rest. Must list exactly the fields `map_sensitive` seals.
pub const CONTACT_SENSITIVE_FIELDS: [&str; 4] = ["first_name", "last_name", "email", "phone"];

/// Form data submitted through the contact page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_method: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

impl ContactFormData {
    fn map_sensitive(
        &self,
        mut f: impl FnMut(&str) -> Result<String, CryptoError>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            first_name: f(&self.first_name)?,
            last_name: f(&self.last_name)?,
            email: f(&self.email)?,
            phone: self.phone.as_deref().map(&mut f).transpose()?,
            contact_method: self.contact_method.clone(),
            reason: self.reason.clone(),
            message: self.message.clone(),
        })
    }
}

/// A contact-form submission as stored, with its document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormDocument {
    pub id: String,
    pub contact_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub delivery: EmailTracking,
    #[serde(flatten)]
    pub data: ContactFormData,
}

/// Return a copy of `data` with every sensitive field sealed.
pub fn encrypt_contact<C: FieldCipher + ?Sized>(
    cipher: &C,
    data: &ContactFormData,
    aad: Option<&str>,
) -> Result<ContactFormData, CryptoError> {
    let aad = aad.unwrap_or_default();
    data.map_sensitive(|v| cipher.encrypt_field(v, aad))
}

/// Return a copy of `doc` with every sensitive field opened.
///
/// # Errors
///
/// The first field that fails to decrypt fails the whole record.
pub fn decrypt_contact<C: FieldCipher + ?Sized>(
    cipher: &C,
    doc: &ContactFormDocument,
    aad: Option<&str>,
) -> Result<ContactFormDocument, CryptoError> {
    let aad = aad.unwrap_or_default();
    let data = doc.data.map_sensitive(|v| cipher.decrypt_field(v, aad))?;
    Ok(ContactFormDocument {
        id: doc.id.clone(),
        contact_type: doc.contact_type.clone(),
        tags: doc.tags.clone(),
        created_at: doc.created_at.clone(),
        status: doc.status.clone(),
        delivery: doc.delivery.clone(),
        data,
    })
}

/// Decrypt a batch, failing on the first record that does not open.
pub fn decrypt_contacts<C: FieldCipher + ?Sized>(
    cipher: &C,
    docs: &[ContactFormDocument],
    aad: Option<&str>,
) -> Result<Vec<ContactFormDocument>, CryptoError> {
    docs.iter()
        .map(|doc| decrypt_contact(cipher, doc, aad))
        .collect()
}

/// Decrypt a batch, skipping and reporting records that do not open.
pub fn decrypt_contacts_partial<C: FieldCipher + ?Sized>(
    cipher: &C,
    docs: &[ContactFormDocument],
    aad: Option<&str>,
) -> BatchDecrypt<ContactFormDocument> {
    decrypt_partial(
        docs,
        |doc| doc.id.as_str(),
        |doc| decrypt_contact(cipher, doc, aad),
    )
}
