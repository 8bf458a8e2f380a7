//! Error type for vault storage and its collaborator utilities.
//!
//! "Not found" is never an error here: lookups return `Option`, deletes
//! return `bool`. Errors are reserved for backend writes that fail and for
//! inputs the utilities cannot make sense of.

use thiserror::Error;

/// Errors produced by the vault core.
#[derive(Debug, Error)]
pub enum VaultError {
    /// SQLite backend failure
    #[error("storage backend error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A collection could not be encoded
    #[error("cannot encode collection: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Write would exceed the backend's byte quota
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload is larger than the configured limit
    #[error("file too large: {size} bytes (maximum is {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    /// Upload MIME type does not match what the collection accepts
    #[error("invalid file type {mime}, expected {accept}")]
    InvalidFileType { mime: String, accept: &'static str },

    #[error("malformed data URL")]
    InvalidDataUrl,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, VaultError>;
