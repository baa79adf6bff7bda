//! Storage Module
//!
//! Persistent string-keyed stores that the TTL cache sits on top of.
//!
//! A store is the local-storage primitive: synchronous get/set/remove of
//! string values plus key enumeration. Several caches may share one store,
//! separated only by their key prefix.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CacheError, Result};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// == Key-Value Store Trait ==
/// Synchronous string key/value persistence.
///
/// Every call is atomic at single-key granularity. There is no versioning:
/// concurrent writers to the same key resolve as last-writer-wins.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Lists every key currently held by the store.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Quota Accounting ==
/// Checks that writing `key = value` keeps the map within `quota` bytes.
///
/// Usage counts key and value lengths, the same way browsers account for
/// their local-storage budget.
pub(crate) fn check_quota(
    items: &BTreeMap<String, String>,
    quota: Option<usize>,
    key: &str,
    value: &str,
) -> Result<()> {
    let Some(quota) = quota else {
        return Ok(());
    };

    let current: usize = items.iter().map(|(k, v)| k.len() + v.len()).sum();
    let replaced = items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let needed = current - replaced + key.len() + value.len();

    if needed > quota {
        return Err(CacheError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

pub(crate) fn poisoned() -> CacheError {
    CacheError::StoreUnavailable("store lock poisoned".to_string())
}
