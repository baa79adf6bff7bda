//! File-backed key-value store
//!
//! Keeps the whole key space in one JSON object on disk, the on-disk
//! analogue of a browser's local storage area.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use directories::ProjectDirs;
use tracing::{debug, warn};

use super::{check_quota, poisoned, KeyValueStore};
use crate::error::{CacheError, Result};

// == File Store ==
/// Key-value store persisted as a single JSON file.
///
/// Reads are served from memory. Every mutation first reloads the file, so
/// writes to other keys made by other handles or processes are kept, then
/// rewrites it through a temporary file and a rename so a crash never leaves
/// a half-written file. Two writers racing between reload and rename still
/// resolve as last-writer-wins for the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl FileStore {
    // == Constructor ==
    /// Opens the store at `path`, loading existing contents if the file
    /// exists. A missing file is an empty store; it is created on first write.
    ///
    /// A file that is not a JSON object of strings is moved aside to
    /// `<name>.json.corrupt` and the store starts empty.
    ///
    /// # Errors
    /// Returns `CacheError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = match load(&path) {
            Ok(items) => items,
            Err(CacheError::CorruptedEntry(reason)) => {
                let backup = path.with_extension("json.corrupt");
                warn!(path = %path.display(), reason = %reason, "Store file is corrupted, starting empty");
                if let Err(e) = fs::rename(&path, &backup) {
                    warn!(path = %backup.display(), error = %e, "Could not back up corrupted store file");
                }
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        debug!(path = %path.display(), keys = items.len(), "Opened file store");

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota: None,
        })
    }

    /// Limits the store to `quota` bytes of keys and values.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Default location: `<platform cache dir>/folio/storage.json`.
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "folio")?;
        Some(dirs.cache_dir().join("storage.json"))
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Persistence ==
    /// Replaces the in-memory view with the file's current contents.
    ///
    /// An unreadable file keeps the in-memory view; the next persist
    /// overwrites it.
    fn refresh(&self, items: &mut BTreeMap<String, String>) {
        match load(&self.path) {
            Ok(on_disk) => *items = on_disk,
            Err(e) => debug!(path = %self.path.display(), error = %e, "Keeping in-memory store view"),
        }
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Reads the store file. Missing or blank files are empty maps.
fn load(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content)
        .map_err(|e| CacheError::CorruptedEntry(format!("{}: {}", path.display(), e)))
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        self.refresh(&mut items);
        check_quota(&items, self.quota, key, value)?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            // Keep memory in step with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        self.refresh(&mut items);
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.keys().cloned().collect())
    }
}
