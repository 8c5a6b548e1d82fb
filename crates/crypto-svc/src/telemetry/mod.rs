//! Structured logging and optional OTLP trace export.
//!
//! Logs are always emitted as JSON on stdout. When an OTLP endpoint is
//! configured, spans are additionally exported over OTLP/gRPC.
//!
//! # Telemetry invariants
//!
//! - **No PII, plaintext, AAD or key material** may appear in any span
//!   attribute or log field. Key ids, versions and error kinds are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   overrides it.

pub mod init;

pub use init::init_telemetry;
