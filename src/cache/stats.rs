//! Cache Statistics Module
//!
//! Read-only diagnostic snapshot of a cache's prefix namespace.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of the entries a cache owns in its store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Whether the underlying store is usable
    pub available: bool,
    /// Number of keys in the cache's namespace
    pub total_items: usize,
    /// Sum of stored value lengths in bytes
    pub total_size: usize,
    /// Entries past their expiration that have not been swept yet
    pub expired_items: usize,
    /// Key prefix of the cache
    pub prefix: String,
    /// Successful reads during this instance's lifetime
    pub hits: u64,
    /// Missed reads (absent, expired, corrupted) during this instance's lifetime
    pub misses: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Stats for a cache whose store is unavailable.
    pub fn unavailable(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Fraction of `get` calls served from the cache; 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    // == Size ==
    /// Total size rounded to the nearest kilobyte.
    pub fn total_size_kb(&self) -> usize {
        (self.total_size + 512) / 1024
    }
}
