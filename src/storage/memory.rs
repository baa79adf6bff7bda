//! In-process key-value store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{check_quota, poisoned, KeyValueStore};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Key-value store held in memory.
///
/// Supports an optional byte quota and a permanently unavailable mode, which
/// stand in for a full or disabled browser storage area.
#[derive(Debug)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
    available: bool,
}

impl MemoryStore {
    // == Constructors ==
    /// Creates an empty, unlimited store.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            quota: None,
            available: true,
        }
    }

    /// Creates an empty store that refuses writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Creates a store whose every operation fails, like storage that has
    /// been disabled by the user or the host.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(CacheError::StoreUnavailable(
                "storage is disabled".to_string(),
            ))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_available()?;
        let mut items = self.items.write().map_err(|_| poisoned())?;
        check_quota(&items, self.quota, key, value)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.ensure_available()?;
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.ensure_available()?;
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.keys().cloned().collect())
    }
}
