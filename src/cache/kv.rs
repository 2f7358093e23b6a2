//! String key-value stores backing the snapshot cache
//!
//! The snapshot cache only needs synchronous `get`/`set`/`remove` on string
//! values, so any persistence layer offering that can sit underneath it.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Synchronous string-keyed storage with string values
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Keys become file names, so they must not be able to escape the directory
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Cache key cannot be empty");
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("Invalid cache key '{key}': only alphanumeric, underscore, and dash are allowed");
    }

    Ok(())
}

/// Stores each key as one file inside a cache directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// In-process store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(f(&mut entries))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::new(temp_dir.path().join("nested"))?;

        assert_eq!(store.get("snapshot")?, None);
        store.set("snapshot", "{\"a\":1}")?;
        assert_eq!(store.get("snapshot")?.as_deref(), Some("{\"a\":1}"));

        store.set("snapshot", "replaced")?;
        assert_eq!(store.get("snapshot")?.as_deref(), Some("replaced"));

        store.remove("snapshot")?;
        assert_eq!(store.get("snapshot")?, None);
        // Removing twice is fine
        store.remove("snapshot")?;
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_unsafe_keys() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::new(temp_dir.path())?;

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.remove("").is_err());
        Ok(())
    }

    #[test]
    fn test_memory_store_clones_share_entries() -> Result<()> {
        let store = MemoryStore::new();
        let view = store.clone();

        store.set("k", "v")?;
        assert_eq!(view.get("k")?.as_deref(), Some("v"));
        assert_eq!(view.len(), 1);

        view.remove("k")?;
        assert!(store.is_empty());
        Ok(())
    }
}
