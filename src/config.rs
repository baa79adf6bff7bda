//! Configuration Module
//!
//! Handles loading configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::{CacheConfig, DEFAULT_PREFIX, DEFAULT_TTL_SECS};
use crate::storage::FileStore;

/// Usual browser local-storage budget
pub const DEFAULT_STORE_QUOTA: usize = 5 * 1024 * 1024;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key prefix of the cache namespace
    pub cache_prefix: String,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Location of the file-backed store, `None` if no cache dir is known
    pub store_path: Option<PathBuf>,
    /// Byte budget of the file-backed store
    pub store_quota: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FOLIO_CACHE_PREFIX` - Cache key prefix (default: portfolio-cache)
    /// - `FOLIO_CACHE_TTL` - Default TTL in seconds (default: 3600)
    /// - `FOLIO_STORE_PATH` - Store file (default: platform cache dir)
    /// - `FOLIO_STORE_QUOTA` - Store budget in bytes (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_prefix: env::var("FOLIO_CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_prefix),
            default_ttl: env::var("FOLIO_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            store_path: env::var("FOLIO_STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or(defaults.store_path),
            store_quota: env::var("FOLIO_STORE_QUOTA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.store_quota),
        }
    }

    /// Cache settings derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            prefix: self.cache_prefix.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL_SECS,
            store_path: FileStore::default_path(),
            store_quota: DEFAULT_STORE_QUOTA,
        }
    }
}
