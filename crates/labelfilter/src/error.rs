//! Error types for catalog lookups and configuration.

use crate::catalog::CatalogMode;
use labelfilter_ids::KeyId;
use thiserror::Error;

/// Errors raised by a catalog lookup.
///
/// Any of these fails the whole resolution or search that issued the lookup.
/// A value id that is absent from its key's value set is not an error.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure talking to the catalog backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Catalog request to {url} failed with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Base URL cannot be used to build catalog endpoints
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    /// The catalog has no such key
    #[error("Unknown label key: {0}")]
    UnknownKey(KeyId),

    /// The catalog refused to serve the key
    #[error("Lookup for label key {key_id} failed: {message}")]
    Unavailable { key_id: KeyId, message: String },

    /// Listing keys failed
    #[error("Loading label keys failed: {0}")]
    KeysUnavailable(String),

    /// No catalog is registered for the requested mode
    #[error("No catalog configured for mode '{0}'")]
    ModeNotConfigured(CatalogMode),

    /// Fixture file could not be read or parsed
    #[error("Catalog fixture error: {0}")]
    Fixture(String),
}

/// Error type for config operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config not found at: {0}")]
    NotFound(String),
}
