//! Server configuration.
//!
//! Built once from the environment in `main` and passed down to the stores
//! and router; nothing below the binary reads environment variables.

use std::path::PathBuf;

/// Default TCP port ("CARD" on a phone keypad).
pub const DEFAULT_PORT: u16 = 2273;

/// Default ceiling for a serialized card document, in bytes (200 KiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 200 * 1024;

/// Default number of cards a single owner may keep.
pub const DEFAULT_MAX_DOCUMENTS_PER_OWNER: usize = 10;

/// Runtime configuration for the card server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to bind on localhost.
    pub port: u16,
    /// Directory for JSON file-per-record persistence. `None` keeps all
    /// records in memory only.
    pub data_dir: Option<PathBuf>,
    /// Maximum serialized document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum number of cards per owner.
    pub max_documents_per_owner: usize,
}

impl ServerConfig {
    /// Build configuration from the environment.
    ///
    /// Recognized variables: `CARD_PORT`, `CARD_DATA_DIR`,
    /// `CARD_MAX_DOCUMENT_BYTES`, `CARD_MAX_DOCUMENTS_PER_OWNER`. Unset or
    /// unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("CARD_PORT").unwrap_or(DEFAULT_PORT),
            data_dir: std::env::var("CARD_DATA_DIR").ok().map(PathBuf::from),
            max_document_bytes: env_parse("CARD_MAX_DOCUMENT_BYTES")
                .unwrap_or(DEFAULT_MAX_DOCUMENT_BYTES),
            max_documents_per_owner: env_parse("CARD_MAX_DOCUMENTS_PER_OWNER")
                .unwrap_or(DEFAULT_MAX_DOCUMENTS_PER_OWNER),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_documents_per_owner: DEFAULT_MAX_DOCUMENTS_PER_OWNER,
        }
    }
}

/// Parse an environment variable, treating unset or unparseable values as
/// absent.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
