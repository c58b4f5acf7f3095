//! Local durable snapshots.
//!
//! A deliberately small key/document store: one JSON document per key, so a
//! page-reload-equivalent (process restart) can put the last-known cart on
//! screen before any network round-trip completes.
//!
//! Persistence is best-effort. Stores never fail a user-visible operation
//! because a snapshot could not be written; failures are logged and the
//! in-memory state stays authoritative until the next successful write.
//!
//! Writes are single-writer-per-process. Two processes sharing a data
//! directory race with last-write-wins semantics; no cross-process lock is
//! taken.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Keys under which stores persist their snapshots.
pub mod persist_keys {
    /// Cart line list.
    pub const CART: &str = "cart";
    /// Capped recent notifications plus unread count.
    pub const NOTIFICATIONS: &str = "notifications";
    /// Wishlist product list.
    pub const WISHLIST: &str = "wishlist";
}

/// Errors raised by a local store.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot was not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Local durable key/document storage.
pub trait LocalStore: Send + Sync {
    /// Read the document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Write the document stored under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Delete the document stored under `key`; no-op if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

// =============================================================================
// Filesystem Store
// =============================================================================

/// Filesystem-backed [`LocalStore`]: one `<key>.json` file per key.
#[derive(Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistError> {
        // Write-then-rename so a crash mid-write never leaves a truncated
        // snapshot behind.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory [`LocalStore`] for tests and the demo.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.lock().map_or(None, |map| map.get(key).cloned()))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistError> {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(key);
        }
        Ok(())
    }
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Load and deserialize a snapshot; corrupt or missing snapshots yield
/// `None` (a bad snapshot must never brick the store on startup).
pub(crate) fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(contents)) => match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt persisted snapshot");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted snapshot");
            None
        }
    }
}

/// Serialize and persist a snapshot, best-effort.
pub(crate) fn save_json<T: Serialize>(store: &dyn LocalStore, key: &str, value: &T) {
    let serialized = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to serialize snapshot");
            return;
        }
    };
    if let Err(e) = store.put(key, &serialized) {
        tracing::warn!(key, error = %e, "Failed to persist snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path()).expect("create store");

        assert!(store.get("cart").expect("get").is_none());
        store.put("cart", r#"[{"x":1}]"#).expect("put");
        assert_eq!(store.get("cart").expect("get"), Some(r#"[{"x":1}]"#.to_string()));

        store.remove("cart").expect("remove");
        assert!(store.get("cart").expect("get").is_none());
        // Removing again is a no-op
        store.remove("cart").expect("remove twice");
    }

    #[test]
    fn test_mem_store_roundtrip() {
        let store = MemStore::new();
        store.put("k", "v").expect("put");
        assert_eq!(store.get("k").expect("get"), Some("v".to_string()));
        store.remove("k").expect("remove");
        assert!(store.get("k").expect("get").is_none());
    }

    #[test]
    fn test_load_json_discards_corrupt_snapshot() {
        let store = MemStore::new();
        store.put("cart", "not json at all").expect("put");
        let loaded: Option<Vec<u32>> = load_json(&store, "cart");
        assert!(loaded.is_none());
    }
}
