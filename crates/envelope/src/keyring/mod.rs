//! Key Registry: the current key, the retired keys, and the envelope policy.
//!
//! # Lifecycle
//!
//! 1. At startup the service resolves a [`KeySource`] from its configuration.
//! 2. [`KeyRegistry::load`] reads either the JSON keyset file or the single
//!    base64 key and validates every entry.
//! 3. The registry is frozen behind an `Arc` for the life of the process.
//!    Rotation is a restart with a new `current` key and the old one listed
//!    under `retired`.
//!
//! # Keyset file format
//!
//! ```json
//! {
//!   "version": "v1",
//!   "requireAad": false,
//!   "current": { "kid": "k2", "keyBase64": "..." },
//!   "retired": [{ "kid": "k1", "keyBase64": "..." }]
//! }
//! ```
//!
//! `version` defaults to `"v1"`, `requireAad` to `false`, `retired` to `[]`.

pub mod entry;

pub use entry::KeyEntry;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::KeyringError;

/// Kid used in single-key mode when none is configured.
pub const DEFAULT_KID: &str = "k1";

/// Envelope version tag used when none is configured.
pub const DEFAULT_VERSION: &str = "v1";

/// Where the registry's key material comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A JSON keyset file holding the current key and any retired keys.
    File(PathBuf),
    /// One key supplied directly, typically from environment variables.
    Single {
        key_base64: String,
        kid: String,
        version: String,
        require_aad: bool,
    },
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
            KeySource::Single {
                kid,
                version,
                require_aad,
                ..
            } => f
                .debug_struct("Single")
                .field("key_base64", &"[REDACTED]")
                .field("kid", kid)
                .field("version", version)
                .field("require_aad", require_aad)
                .finish(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeysetFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    require_aad: bool,
    current: KeysetKey,
    #[serde(default)]
    retired: Vec<KeysetKey>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeysetKey {
    kid: String,
    key_base64: String,
}

fn default_version() -> String {
    DEFAULT_VERSION.into()
}

/// Immutable set of keys plus the envelope policy flags.
///
/// Invariants upheld by every constructor:
/// - every key is exactly 32 bytes;
/// - kids are non-empty, free of `:`, and unique across current and retired;
/// - the version tag is non-empty and free of `:`.
#[derive(Debug)]
pub struct KeyRegistry {
    version: String,
    require_aad: bool,
    current: KeyEntry,
    retired: Vec<KeyEntry>,
}

impl KeyRegistry {
    /// Assemble a registry from already-built entries.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::InvalidIdentifier`] for a bad version tag and
    /// [`KeyringError::DuplicateKid`] if two entries share a kid.
    pub fn new(
        version: impl Into<String>,
        require_aad: bool,
        current: KeyEntry,
        retired: Vec<KeyEntry>,
    ) -> Result<Self, KeyringError> {
        let version = version.into();
        validate_identifier("version", &version)?;

        let mut seen = HashSet::new();
        for entry in std::iter::once(&current).chain(retired.iter()) {
            if !seen.insert(entry.kid()) {
                return Err(KeyringError::DuplicateKid(entry.kid().to_owned()));
            }
        }

        let registry = Self {
            version,
            require_aad,
            current,
            retired,
        };
        info!(
            version = %registry.version,
            current_kid = %registry.current.kid(),
            retired = registry.retired.len(),
            require_aad = registry.require_aad,
            "key registry loaded"
        );
        Ok(registry)
    }

    /// Build the registry from whichever source the configuration selected.
    pub fn load(source: &KeySource) -> Result<Self, KeyringError> {
        match source {
            KeySource::File(path) => Self::from_keyset_file(path),
            KeySource::Single {
                key_base64,
                kid,
                version,
                require_aad,
            } => Self::single(key_base64, kid, version, *require_aad),
        }
    }

    /// Single-key mode: one current key, no retired keys.
    pub fn single(
        key_base64: &str,
        kid: &str,
        version: &str,
        require_aad: bool,
    ) -> Result<Self, KeyringError> {
        let current = KeyEntry::from_base64(kid, key_base64)?;
        Self::new(version, require_aad, current, Vec::new())
    }

    /// Read and parse a JSON keyset file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::Io`] if the file cannot be read, and any error
    /// of [`KeyRegistry::from_keyset_json`] for its contents.
    pub fn from_keyset_file(path: impl AsRef<Path>) -> Result<Self, KeyringError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| KeyringError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_keyset_json(&raw)
    }

    /// Parse a keyset document already held in memory.
    pub fn from_keyset_json(json: &str) -> Result<Self, KeyringError> {
        let parsed: KeysetFile = serde_json::from_str(json)?;
        let current = KeyEntry::from_base64(parsed.current.kid, &parsed.current.key_base64)?;
        let retired = parsed
            .retired
            .into_iter()
            .map(|k| KeyEntry::from_base64(k.kid, &k.key_base64))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed.version, parsed.require_aad, current, retired)
    }

    /// Envelope format tag written by and accepted by this registry.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether encryption must be given non-empty AAD.
    pub fn require_aad(&self) -> bool {
        self.require_aad
    }

    /// The key used for every new envelope.
    pub fn current(&self) -> &KeyEntry {
        &self.current
    }

    /// Keys kept only to open older envelopes.
    pub fn retired(&self) -> &[KeyEntry] {
        &self.retired
    }

    /// Resolve a kid against the current key and all retired keys.
    pub fn find_key(&self, kid: &str) -> Option<&KeyEntry> {
        std::iter::once(&self.current)
            .chain(self.retired.iter())
            .find(|entry| entry.kid() == kid)
    }

    /// All kids, current first.
    pub fn kids(&self) -> Vec<&str> {
        std::iter::once(&self.current)
            .chain(self.retired.iter())
            .map(KeyEntry::kid)
            .collect()
    }

    /// Number of keys available for decryption.
    pub fn len(&self) -> usize {
        1 + self.retired.len()
    }

    /// Always `false`: a registry holds at least its current key.
    pub fn is_empty(&self) -> bool {
        false
    }
}

pub(crate) fn validate_identifier(field: &'static str, value: &str) -> Result<(), KeyringError> {
    if value.is_empty() || value.contains(':') {
        return Err(KeyringError::InvalidIdentifier {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn b64(byte: u8) -> String {
        STANDARD.encode([byte; KEY_LEN])
    }

    #[test]
    fn single_key_mode() {
        let reg = KeyRegistry::single(&b64(0), DEFAULT_KID, DEFAULT_VERSION, false).unwrap();
        assert_eq!(reg.version(), "v1");
        assert_eq!(reg.current().kid(), "k1");
        assert!(reg.retired().is_empty());
        assert!(!reg.require_aad());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn single_key_mode_rejects_empty_key() {
        let err = KeyRegistry::single("", "k1", "v1", false).unwrap_err();
        assert!(matches!(err, KeyringError::InvalidKeyLength { len: 0, .. }));
    }

    #[test]
    fn keyset_json_with_defaults() {
        let json = format!(r#"{{"current": {{"kid": "k1", "keyBase64": "{}"}}}}"#, b64(1));
        let reg = KeyRegistry::from_keyset_json(&json).unwrap();
        assert_eq!(reg.version(), DEFAULT_VERSION);
        assert!(!reg.require_aad());
        assert_eq!(reg.kids(), vec!["k1"]);
    }

    #[test]
    fn keyset_json_with_retired_keys() {
        let json = format!(
            r#"{{
                "version": "v1",
                "requireAad": true,
                "current": {{"kid": "k3", "keyBase64": "{}"}},
                "retired": [
                    {{"kid": "k2", "keyBase64": "{}"}},
                    {{"kid": "k1", "keyBase64": "{}"}}
                ]
            }}"#,
            b64(3),
            b64(2),
            b64(1)
        );
        let reg = KeyRegistry::from_keyset_json(&json).unwrap();
        assert!(reg.require_aad());
        assert_eq!(reg.kids(), vec!["k3", "k2", "k1"]);
        assert_eq!(reg.find_key("k1").unwrap().key(), &[1u8; KEY_LEN][..]);
        assert_eq!(reg.find_key("k3").unwrap().kid(), "k3");
        assert!(reg.find_key("k4").is_none());
    }

    #[test]
    fn keyset_json_rejects_short_retired_key() {
        let json = format!(
            r#"{{"current": {{"kid": "k2", "keyBase64": "{}"}},
                "retired": [{{"kid": "k1", "keyBase64": "{}"}}]}}"#,
            b64(2),
            STANDARD.encode([0u8; 24])
        );
        let err = KeyRegistry::from_keyset_json(&json).unwrap_err();
        assert!(matches!(err, KeyringError::InvalidKeyLength { ref kid, len: 24 } if kid == "k1"));
    }

    #[test]
    fn keyset_json_rejects_duplicate_kid() {
        let json = format!(
            r#"{{"current": {{"kid": "k1", "keyBase64": "{}"}},
                "retired": [{{"kid": "k1", "keyBase64": "{}"}}]}}"#,
            b64(2),
            b64(1)
        );
        let err = KeyRegistry::from_keyset_json(&json).unwrap_err();
        assert!(matches!(err, KeyringError::DuplicateKid(ref kid) if kid == "k1"));
    }

    #[test]
    fn keyset_json_rejects_missing_current() {
        let err = KeyRegistry::from_keyset_json(r#"{"version": "v1"}"#).unwrap_err();
        assert!(matches!(err, KeyringError::Json(_)));
    }

    #[test]
    fn rejects_version_with_delimiter() {
        let err = KeyRegistry::single(&b64(0), "k1", "v:1", false).unwrap_err();
        assert!(matches!(err, KeyringError::InvalidIdentifier { field: "version", .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = KeyRegistry::from_keyset_file("/nonexistent/crypto-keys.json").unwrap_err();
        assert!(matches!(err, KeyringError::Io { .. }));
    }

    #[test]
    fn load_dispatches_single() {
        let source = KeySource::Single {
            key_base64: b64(9),
            kid: "prod-2024".into(),
            version: "v1".into(),
            require_aad: true,
        };
        let reg = KeyRegistry::load(&source).unwrap();
        assert_eq!(reg.current().kid(), "prod-2024");
        assert!(reg.require_aad());
    }

    #[test]
    fn key_source_debug_redacts_key() {
        let source = KeySource::Single {
            key_base64: b64(9),
            kid: "k1".into(),
            version: "v1".into(),
            require_aad: false,
        };
        let dbg = format!("{source:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(&b64(9)));
    }
}
