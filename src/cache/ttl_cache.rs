//! TTL Cache Module
//!
//! Fail-soft cache of JSON values with per-entry expiration, layered over a
//! shared key-value store and namespaced by a key prefix.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::CacheEntry;
use crate::cache::stats::CacheStats;
use crate::cache::{DEFAULT_PREFIX, DEFAULT_TTL_SECS};
use crate::error::{CacheError, Result};
use crate::storage::KeyValueStore;

// == Cache Config ==
/// Construction-time settings of a [`TtlCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Namespace prefix for every key this cache writes
    pub prefix: String,
    /// TTL in seconds used when `set` is called without one
    pub default_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL_SECS,
        }
    }
}

// == TTL Cache ==
/// Best-effort persistent cache.
///
/// The store is probed once at construction. If the probe fails the cache
/// stays disabled for its whole lifetime and every operation returns its
/// empty/failure value. No operation ever propagates an error: a miss and a
/// failure look the same to the caller, who must always have a fallback.
#[derive(Debug)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    /// `prefix` followed by the key separator
    namespace: String,
    default_ttl: u64,
    available: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlCache {
    // == Constructors ==
    /// Creates a cache over `store` using the system clock.
    ///
    /// Probes the store and, when usable, sweeps expired and corrupted
    /// entries left behind by earlier sessions.
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let available = probe(store.as_ref(), &config.prefix);
        let cache = Self {
            store,
            clock,
            namespace: format!("{}-", config.prefix),
            prefix: config.prefix,
            default_ttl: config.default_ttl,
            available,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        };

        if cache.available {
            let cleaned = cache.clean_expired();
            if cleaned > 0 {
                info!(prefix = %cache.prefix, cleaned, "Removed stale cache entries on startup");
            }
        }

        cache
    }

    // == Accessors ==
    /// Returns whether the store passed the construction-time probe.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Returns the store key a caller key maps to.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` seconds (default TTL if `None`).
    ///
    /// Returns false if the value cannot be serialized or the store refuses
    /// the write; nothing is written in that case.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        if !self.available {
            return false;
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        let full_key = self.full_key(key);

        let result = serde_json::to_string(&entry)
            .map_err(CacheError::from)
            .and_then(|json| self.store.set_item(&full_key, &json));

        match result {
            Ok(()) => {
                debug!(key = %full_key, ttl, "Stored cache entry");
                true
            }
            Err(e) => {
                error!(key = %full_key, error = %e, "Error storing data in cache");
                false
            }
        }
    }

    // == Get ==
    /// Returns the value under `key` if present and not expired.
    ///
    /// Expired and corrupted entries are deleted on the way. A well-formed
    /// entry whose data does not decode as `T` is a miss but is kept.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).and_then(|data| {
            serde_json::from_value(data)
                .map_err(|e| warn!(key, error = %e, "Cached data has an unexpected shape"))
                .ok()
        });

        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        if !self.available {
            return None;
        }

        let full_key = self.full_key(key);
        let raw = match self.store.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(key = %full_key, error = %e, "Error retrieving data from cache");
                return None;
            }
        };

        let entry = match parse_entry(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Dropping corrupted cache entry");
                self.delete(&full_key);
                return None;
            }
        };

        if entry.is_expired_at(self.clock.now_ms()) {
            debug!(key = %full_key, "Cache entry expired");
            self.delete(&full_key);
            return None;
        }

        Some(entry.data)
    }

    // == Remove ==
    /// Deletes `key` whether or not it exists.
    ///
    /// Returns false only if the store is unavailable or refuses the delete.
    pub fn remove(&self, key: &str) -> bool {
        if !self.available {
            return false;
        }
        self.delete(&self.full_key(key))
    }

    // == Clean Expired ==
    /// Deletes every expired or corrupted entry in the namespace.
    ///
    /// Returns the number of entries deleted.
    pub fn clean_expired(&self) -> usize {
        if !self.available {
            return 0;
        }

        let keys = match self.namespace_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(prefix = %self.prefix, error = %e, "Error cleaning expired cache entries");
                return 0;
            }
        };

        let now = self.clock.now_ms();
        let mut cleaned = 0;

        for key in keys {
            let stale = match self.store.get_item(&key) {
                Ok(Some(raw)) => match parse_entry(&raw) {
                    Ok(entry) => entry.is_expired_at(now),
                    Err(_) => true,
                },
                // Removed by someone else since the key listing
                Ok(None) => false,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable cache entry");
                    false
                }
            };

            if stale && self.delete(&key) {
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            debug!(prefix = %self.prefix, cleaned, "Swept cache namespace");
        }
        cleaned
    }

    // == Clear ==
    /// Deletes every entry in the namespace regardless of expiry.
    ///
    /// Keys outside the namespace are untouched. Returns false if the store
    /// is unavailable or any delete failed.
    pub fn clear(&self) -> bool {
        if !self.available {
            return false;
        }

        let keys = match self.namespace_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(prefix = %self.prefix, error = %e, "Error clearing cache");
                return false;
            }
        };

        let removed = keys.iter().filter(|key| self.delete(key)).count();
        info!(prefix = %self.prefix, removed, "Cleared cache");
        removed == keys.len()
    }

    // == Stats ==
    /// Returns a snapshot of the namespace. Never deletes anything, even
    /// entries it finds expired.
    pub fn get_stats(&self) -> CacheStats {
        if !self.available {
            return CacheStats::unavailable(&self.prefix);
        }

        let keys = match self.namespace_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(prefix = %self.prefix, error = %e, "Error getting cache statistics");
                return CacheStats::unavailable(&self.prefix);
            }
        };

        let now = self.clock.now_ms();
        let mut stats = CacheStats {
            available: true,
            prefix: self.prefix.clone(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };

        for key in keys {
            let Ok(Some(raw)) = self.store.get_item(&key) else {
                continue;
            };
            stats.total_items += 1;
            stats.total_size += raw.len();

            if let Ok(entry) = parse_entry(&raw) {
                if entry.is_expired_at(now) {
                    stats.expired_items += 1;
                }
            }
        }

        stats
    }

    // == Helpers ==
    fn namespace_keys(&self) -> Result<Vec<String>> {
        let keys = self.store.keys()?;
        Ok(keys
            .into_iter()
            .filter(|key| key.starts_with(&self.namespace))
            .collect())
    }

    /// Deletes a full store key, logging instead of failing.
    fn delete(&self, full_key: &str) -> bool {
        match self.store.remove_item(full_key) {
            Ok(()) => true,
            Err(e) => {
                error!(key = %full_key, error = %e, "Error removing item from cache");
                false
            }
        }
    }
}

/// Writes and removes a probe key to check that the store is usable.
fn probe(store: &dyn KeyValueStore, prefix: &str) -> bool {
    let test_key = format!("{}-test", prefix);
    let result = store
        .set_item(&test_key, "test")
        .and_then(|()| store.remove_item(&test_key));

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Key-value store is not available. Caching will be disabled.");
            false
        }
    }
}

fn parse_entry(raw: &str) -> Result<CacheEntry<Value>> {
    serde_json::from_str(raw).map_err(|e| CacheError::CorruptedEntry(e.to_string()))
}
