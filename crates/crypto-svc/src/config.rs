//! Configuration loading and validation for the crypto service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if the key material cannot be located or a
//! value is invalid.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use envelope::KeySource;
use serde::Deserialize;

/// Validated crypto service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Path to a JSON keyset file. Takes precedence over single-key mode when
    /// set and non-blank.
    #[serde(default)]
    pub crypto_keys_file: Option<String>,

    /// Base64 AES-256 key for single-key mode. **Required** without a keyset file.
    #[serde(default)]
    pub crypto_key_base64: Option<String>,

    /// Key id of the single key.
    #[serde(default = "default_kid")]
    pub crypto_kid: String,

    /// Envelope version tag in single-key mode.
    #[serde(default = "default_version")]
    pub crypto_version: String,

    /// `"true"` (any case) enables the AAD policy in single-key mode.
    #[serde(default)]
    pub crypto_require_aad: Option<String>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP collector endpoint. Spans are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Shared secret expected in the `x-api-key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_kid() -> String {
    envelope::keyring::DEFAULT_KID.into()
}
fn default_version() -> String {
    envelope::keyring::DEFAULT_VERSION.into()
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or no key source is set.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    /// Blank variables count as unset, so `CRYPTO_KID=` falls back to `k1`.
    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env.ignore_empty(true))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.keys_file().is_none() {
            match &self.crypto_key_base64 {
                Some(key) => ensure_non_empty(key, "CRYPTO_KEY_BASE64")?,
                None => anyhow::bail!("CRYPTO_KEYS_FILE or CRYPTO_KEY_BASE64 must be set"),
            }
        }
        ensure_non_empty(&self.log_level, "LOG_LEVEL")?;

        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        if matches!(&self.api_key, Some(k) if k.trim().is_empty()) {
            anyhow::bail!("API_KEY must not be blank when set");
        }
        Ok(())
    }

    fn keys_file(&self) -> Option<&str> {
        self.crypto_keys_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Whether single-key mode enforces AAD on encryption.
    pub fn require_aad(&self) -> bool {
        self.crypto_require_aad
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Where the key registry is loaded from.
    pub fn key_source(&self) -> KeySource {
        match self.keys_file() {
            Some(path) => KeySource::File(PathBuf::from(path)),
            None => KeySource::Single {
                key_base64: self.crypto_key_base64.clone().unwrap_or_default(),
                kid: or_default(&self.crypto_kid, envelope::keyring::DEFAULT_KID),
                version: or_default(&self.crypto_version, envelope::keyring::DEFAULT_VERSION),
                require_aad: self.require_aad(),
            },
        }
    }

    /// OTLP endpoint, if one is configured and non-blank.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otel_exporter_otlp_endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Config")
            .field("crypto_keys_file", &self.crypto_keys_file)
            .field("crypto_key_base64", &redact(&self.crypto_key_base64))
            .field("crypto_kid", &self.crypto_kid)
            .field("crypto_version", &self.crypto_version)
            .field("crypto_require_aad", &self.crypto_require_aad)
            .field("listen_port", &self.listen_port)
            .field("log_level", &self.log_level)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.into(),
        v => v.into(),
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_key() -> Config {
        Config {
            crypto_keys_file: None,
            crypto_key_base64: Some("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into()),
            crypto_kid: default_kid(),
            crypto_version: default_version(),
            crypto_require_aad: None,
            listen_port: default_listen_port(),
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_kid(), "k1");
        assert_eq!(default_version(), "v1");
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_request_timeout(), 30);
    }

    #[test]
    fn single_key_config_is_valid() {
        let cfg = single_key();
        assert!(cfg.validate().is_ok());
        match cfg.key_source() {
            KeySource::Single {
                kid,
                version,
                require_aad,
                ..
            } => {
                assert_eq!(kid, "k1");
                assert_eq!(version, "v1");
                assert!(!require_aad);
            }
            other => panic!("expected single-key source, got {other:?}"),
        }
    }

    #[test]
    fn keys_file_takes_precedence() {
        let cfg = Config {
            crypto_keys_file: Some(" ./secrets/crypto-keys.json ".into()),
            crypto_key_base64: None,
            ..single_key()
        };
        assert!(cfg.validate().is_ok());
        assert!(matches!(
            cfg.key_source(),
            KeySource::File(p) if p == PathBuf::from("./secrets/crypto-keys.json")
        ));
    }

    #[test]
    fn blank_keys_file_falls_back_to_single_key() {
        let cfg = Config {
            crypto_keys_file: Some("   ".into()),
            ..single_key()
        };
        assert!(matches!(cfg.key_source(), KeySource::Single { .. }));
    }

    #[test]
    fn blank_kid_and_version_fall_back_to_defaults() {
        let cfg = Config {
            crypto_kid: "".into(),
            crypto_version: "  ".into(),
            ..single_key()
        };
        assert!(cfg.validate().is_ok());
        assert!(matches!(
            cfg.key_source(),
            KeySource::Single { kid, version, .. } if kid == "k1" && version == "v1"
        ));
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn from_environment_treats_blank_vars_as_unset() {
        let cfg = Config::from_environment(env(&[
            ("CRYPTO_KEY_BASE64", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="),
            ("CRYPTO_KID", ""),
            ("CRYPTO_VERSION", ""),
            ("LOG_LEVEL", ""),
            ("LISTEN_PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(cfg.crypto_kid, "k1");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.listen_port, 9090);
        assert!(matches!(
            cfg.key_source(),
            KeySource::Single { kid, version, .. } if kid == "k1" && version == "v1"
        ));
    }

    #[test]
    fn from_environment_requires_key_material() {
        assert!(Config::from_environment(env(&[("CRYPTO_KEY_BASE64", "")])).is_err());
        assert!(Config::from_environment(env(&[])).is_err());
    }

    #[test]
    fn from_environment_prefers_keys_file() {
        let cfg = Config::from_environment(env(&[
            ("CRYPTO_KEYS_FILE", "/run/secrets/crypto-keys.json"),
            ("CRYPTO_REQUIRE_AAD", "TRUE"),
        ]))
        .unwrap();
        assert!(matches!(cfg.key_source(), KeySource::File(_)));
        assert!(cfg.require_aad());
    }

    #[test]
    fn validate_rejects_missing_key_material() {
        let cfg = Config {
            crypto_key_base64: None,
            ..single_key()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            crypto_key_base64: Some("  ".into()),
            ..single_key()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = Config {
            request_timeout_secs: 0,
            ..single_key()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_api_key() {
        let cfg = Config {
            api_key: Some(" ".into()),
            ..single_key()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn require_aad_only_for_true() {
        for (raw, expected) in [
            (Some("true"), true),
            (Some("TRUE"), true),
            (Some("True"), true),
            (Some("1"), false),
            (Some("yes"), false),
            (Some(""), false),
            (None, false),
        ] {
            let cfg = Config {
                crypto_require_aad: raw.map(str::to_owned),
                ..single_key()
            };
            assert_eq!(cfg.require_aad(), expected, "{raw:?}");
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = Config {
            api_key: Some("s3cret-api-key".into()),
            ..single_key()
        };
        let out = format!("{cfg:?}");
        assert!(!out.contains("s3cret-api-key"));
        assert!(!out.contains("AAAAAAAA"));
        assert!(out.contains("[REDACTED]"));
    }
}
