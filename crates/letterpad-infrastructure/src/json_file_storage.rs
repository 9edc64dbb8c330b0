//! Durable local key-value storage backed by a JSON file.
//!
//! The browser original kept its three keys in `localStorage`; here they
//! live in a small flat JSON map on disk so tokens and the cached folder id
//! survive a restart.

use letterpad_core::error::{LetterpadError, Result};
use letterpad_core::storage::{KeyValueStorage, StorageKey};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// File-backed [`KeyValueStorage`].
///
/// The full map is cached in memory; every write persists the whole file.
/// The values are a handful of short tokens, so whole-file rewrites are
/// fine.
#[derive(Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl JsonFileStorage {
    /// Opens (or creates) the storage file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file contains invalid JSON.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cache = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: Arc::new(RwLock::new(cache)),
        })
    }

    /// Opens the storage file at the default location (~/.letterpad/storage.json).
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| LetterpadError::storage("failed to get home directory"))?;
        Self::new(home_dir.join(".letterpad").join("storage.json"))
    }

    fn persist(&self, map: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn lock_err() -> LetterpadError {
        LetterpadError::storage("storage lock poisoned")
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for JsonFileStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let cache = self.cache.read().map_err(|_| Self::lock_err())?;
        Ok(cache.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut cache = self.cache.write().map_err(|_| Self::lock_err())?;
        cache.insert(key.as_str().to_string(), value.to_string());
        self.persist(&cache)
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        let mut cache = self.cache.write().map_err(|_| Self::lock_err())?;
        if cache.remove(key.as_str()).is_some() {
            self.persist(&cache)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json")).unwrap();

        storage.set(StorageKey::IdToken, "token-1").await.unwrap();
        let value = storage.get(StorageKey::IdToken).await.unwrap();
        assert_eq!(value.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json")).unwrap();

        assert!(storage.get(StorageKey::FolderId).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("storage.json")).unwrap();

        storage.set(StorageKey::DriveToken, "drive-1").await.unwrap();
        storage.remove(StorageKey::DriveToken).await.unwrap();
        storage.remove(StorageKey::DriveToken).await.unwrap();
        assert!(storage.get(StorageKey::DriveToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let storage = JsonFileStorage::new(&path).unwrap();
            storage.set(StorageKey::FolderId, "folder-42").await.unwrap();
        }

        let reopened = JsonFileStorage::new(&path).unwrap();
        let value = reopened.get(StorageKey::FolderId).await.unwrap();
        assert_eq!(value.as_deref(), Some("folder-42"));
    }
}
