//! Error types for the content core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by key-value stores and the TTL cache.
///
/// The cache itself never hands these to its callers; they are logged and
/// collapsed into `bool`/`Option` sentinels.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying store cannot be used at all
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Write refused because it would exceed the store's byte budget
    #[error("Quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Value could not be encoded as JSON
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value is not a valid cache entry
    #[error("Corrupted entry: {0}")]
    CorruptedEntry(String),

    /// File-backed store I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Fetch Error Enum ==
/// Errors raised while fetching JSON content over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP error! Status: {status} ({url})")]
    Status { url: String, status: u16 },

    /// Body was not valid JSON for the requested type
    #[error("Invalid data format from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, CacheError>;
