use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use envelope::{CryptoError, CryptoService, KeyRegistry, KeySource, KeyringError};

fn key_b64(byte: u8) -> String {
    STANDARD.encode([byte; 32])
}

fn write_keyset(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn rotated_registry_still_opens_old_envelopes() {
    let before = write_keyset(&format!(
        r#"{{"version": "v1", "current": {{"kid": "k1", "keyBase64": "{}"}}}}"#,
        key_b64(0x11)
    ));
    let old = CryptoService::new(KeyRegistry::from_keyset_file(before.path()).unwrap());
    let old_env = old.encrypt("42 Harbor Rd", Some("ride_requests")).unwrap();
    assert!(old_env.starts_with("v1:k1:"));

    let after = write_keyset(&format!(
        r#"{{
            "version": "v1",
            "current": {{"kid": "k2", "keyBase64": "{}"}},
            "retired": [{{"kid": "k1", "keyBase64": "{}"}}]
        }}"#,
        key_b64(0x22),
        key_b64(0x11)
    ));
    let source = KeySource::File(after.path().to_path_buf());
    let rotated = CryptoService::new(KeyRegistry::load(&source).unwrap());

    assert_eq!(
        rotated.decrypt(&old_env, Some("ride_requests")).unwrap(),
        "42 Harbor Rd"
    );

    let new_env = rotated.encrypt("42 Harbor Rd", Some("ride_requests")).unwrap();
    assert!(new_env.starts_with("v1:k2:"));

    // The pre-rotation service has never seen k2.
    assert_eq!(
        old.decrypt(&new_env, Some("ride_requests")),
        Err(CryptoError::UnknownKey("k2".into()))
    );
}

#[test]
fn dropping_a_retired_key_makes_its_envelopes_unknown() {
    let with_k1 = CryptoService::new(KeyRegistry::single(&key_b64(1), "k1", "v1", false).unwrap());
    let env = with_k1.encrypt("Jane", None).unwrap();

    let without_k1 =
        CryptoService::new(KeyRegistry::single(&key_b64(2), "k2", "v1", false).unwrap());
    assert_eq!(
        without_k1.decrypt(&env, None),
        Err(CryptoError::UnknownKey("k1".into()))
    );
}

#[test]
fn same_kid_different_key_fails_authentication() {
    let a = CryptoService::new(KeyRegistry::single(&key_b64(1), "k1", "v1", false).unwrap());
    let b = CryptoService::new(KeyRegistry::single(&key_b64(2), "k1", "v1", false).unwrap());
    let env = a.encrypt("Jane", None).unwrap();
    assert_eq!(b.decrypt(&env, None), Err(CryptoError::AuthenticationFailed));
}

#[test]
fn version_bump_rejects_old_envelopes() {
    let v1 = CryptoService::new(KeyRegistry::single(&key_b64(1), "k1", "v1", false).unwrap());
    let v2 = CryptoService::new(KeyRegistry::single(&key_b64(1), "k1", "v2", false).unwrap());
    let env = v1.encrypt("Jane", None).unwrap();
    assert_eq!(
        v2.decrypt(&env, None),
        Err(CryptoError::UnsupportedVersion { found: "v1".into() })
    );
}

#[test]
fn malformed_keyset_file_is_fatal() {
    let file = write_keyset("{ not json");
    let err = KeyRegistry::from_keyset_file(file.path()).unwrap_err();
    assert!(matches!(err, KeyringError::Json(_)));
}

#[test]
fn keyset_file_with_short_current_key_is_fatal() {
    let file = write_keyset(&format!(
        r#"{{"current": {{"kid": "k1", "keyBase64": "{}"}}}}"#,
        STANDARD.encode([0u8; 16])
    ));
    let err = KeyRegistry::from_keyset_file(file.path()).unwrap_err();
    assert!(matches!(err, KeyringError::InvalidKeyLength { len: 16, .. }));
}
