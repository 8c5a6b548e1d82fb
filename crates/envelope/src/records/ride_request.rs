//! Ride-request records.
//!
//! Encrypted fields: `name`, `dob`, `phone`, `email`, `med_id`,
//! `pickup_address`, `dropoff_address`. `apt_date`, `apt_time` and `notes`
//! are stored in plaintext, as are all document metadata fields.

use serde::{Deserialize, Serialize};

use super::{decrypt_partial, BatchDecrypt, EmailTracking, FieldCipher};
use crate::error::CryptoError;

/// Field names encrypted at rest. Must list exactly the fields `map_sensitive` seals.
pub const RIDE_REQUEST_SENSITIVE_FIELDS: [&str; 7] = [
    "name",
    "dob",
    "phone",
    "email",
    "med_id",
    "pickup_address",
    "dropoff_address",
];

/// Form data submitted by a rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRequestData {
    pub name: String,
    /// ISO date.
    pub dob: String,
    pub phone: String,
    pub email: String,
    /// Medicaid id.
    pub med_id: String,
    pub apt_date: String,
    pub apt_time: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    #[serde(default)]
    pub notes: String,
}

impl RideRequestData {
    fn map_sensitive(
        &self,
        mut f: impl FnMut(&str) -> Result<String, CryptoError>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            name: f(&self.name)?,
            dob: f(&self.dob)?,
            phone: f(&self.phone)?,
            email: f(&self.email)?,
            med_id: f(&self.med_id)?,
            apt_date: self.apt_date.clone(),
            apt_time: self.apt_time.clone(),
            pickup_address: f(&self.pickup_address)?,
            dropoff_address: f(&self.dropoff_address)?,
            notes: self.notes.clone(),
        })
    }
}

/// Workflow state of a stored ride request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideRequestStatus {
    #[default]
    New,
    Reviewing,
    Scheduled,
    Spam,
    Closed,
}

/// A ride request as stored, with its document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRequestDocument {
    pub id: String,
    pub contact_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub status: RideRequestStatus,
    #[serde(flatten)]
    pub delivery: EmailTracking,
    #[serde(flatten)]
    pub data: RideRequestData,
}

/// Return a copy of `data` with every sensitive field sealed.
pub fn encrypt_ride_request<C: FieldCipher + ?Sized>(
    cipher: &C,
    data: &RideRequestData,
    aad: Option<&str>,
) -> Result<RideRequestData, CryptoError> {
    let aad = aad.unwrap_or_default();
    data.map_sensitive(|v| cipher.encrypt_field(v, aad))
}

/// Return a copy of `doc` with every sensitive field opened.
///
/// # Errors
///
/// The first field that fails to decrypt fails the whole record.
pub fn decrypt_ride_request<C: FieldCipher + ?Sized>(
    cipher: &C,
    doc: &RideRequestDocument,
    aad: Option<&str>,
) -> Result<RideRequestDocument, CryptoError> {
    let aad = aad.unwrap_or_default();
    let data = doc.data.map_sensitive(|v| cipher.decrypt_field(v, aad))?;
    Ok(RideRequestDocument {
        id: doc.id.clone(),
        contact_type: doc.contact_type.clone(),
        tags: doc.tags.clone(),
        created_at: doc.created_at.clone(),
        status: doc.status,
        delivery: doc.delivery.clone(),
        data,
    })
}

/// Decrypt a batch, failing on the first record that does not open.
pub fn decrypt_ride_requests<C: FieldCipher + ?Sized>(
    cipher: &C,
    docs: &[RideRequestDocument],
    aad: Option<&str>,
) -> Result<Vec<RideRequestDocument>, CryptoError> {
    docs.iter()
        .map(|doc| decrypt_ride_request(cipher, doc, aad))
        .collect()
}

/// Decrypt a batch, skipping and reporting records that do not open.
pub fn decrypt_ride_requests_partial<C: FieldCipher + ?Sized>(
    cipher: &C,
    docs: &[RideRequestDocument],
    aad: Option<&str>,
) -> BatchDecrypt<RideRequestDocument> {
    decrypt_partial(
        docs,
        |doc| doc.id.as_str(),
        |doc| decrypt_ride_request(cipher, doc, aad),
    )
}
