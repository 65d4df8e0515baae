//! Persisted key-value store standing in for browser `localStorage`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sessions keep the serialized identity, password or token here so a new
//! process can rehydrate them. `FileStore` writes a single JSON object to
//! disk on every mutation; `MemoryStore` backs tests and ephemeral runs.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ClientError;

/// String-keyed storage with `localStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns `Storage` if the backing medium rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    /// # Errors
    ///
    /// Returns `Storage` if the backing medium rejects the write.
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Load a JSON value stored under `key`. Unparsable values are logged and
/// treated as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "discarding unparsable stored value");
            None
        }
    }
}

/// Save a JSON value under `key`.
///
/// # Errors
///
/// Returns `Parse` if serialization fails or `Storage` if the write fails.
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), ClientError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store. The whole map is rewritten through a temp file and
/// renamed into place so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the parent directory cannot be created or the
    /// existing file cannot be read. A corrupt file is logged and replaced
    /// by an empty map.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "storage file is corrupt; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut entries = self.entries();
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut entries = self.entries();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
