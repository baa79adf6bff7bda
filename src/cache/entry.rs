//! Cache Entry Module
//!
//! Defines the stored envelope for a cached value with its expiration time.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value together with its absolute expiration time.
///
/// Stored as `{"data": ..., "expiresAt": <ms since epoch>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheEntry<T> {
    /// The cached value
    pub data: T,
    /// Expiration timestamp (Unix milliseconds)
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` after `now_ms`.
    pub fn new(data: T, ttl_seconds: u64, now_ms: i64) -> Self {
        let ttl_ms = i64::try_from(ttl_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        Self {
            data,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now_ms`.
    ///
    /// An entry is still valid at exactly its expiration instant and expired
    /// from the next millisecond on.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}
