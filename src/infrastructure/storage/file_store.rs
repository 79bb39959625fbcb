//! TOML file backed key/value store.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;

/// Stores values in a flat TOML table, rewriting the file atomically.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::ReadFailed(e.to_string())),
        };

        match toml::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Credential file is corrupt, ignoring it");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn save(&self, entries: BTreeMap<String, String>) -> Result<(), StorageError> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &entries))
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?
    }

    async fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool + Send,
    {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await?;
        if apply(&mut entries) {
            self.save(entries).await?;
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let content =
        toml::to_string(entries).map_err(|e| StorageError::WriteFailed(e.to_string()))?;

    let parent = path
        .parent()
        .ok_or_else(|| StorageError::AccessFailed("invalid credential file path".to_string()))?;
    std::fs::create_dir_all(parent).map_err(|e| StorageError::AccessFailed(e.to_string()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
    temp_file
        .persist(path)
        .map_err(|e| StorageError::WriteFailed(e.error.to_string()))?;

    debug!(path = %path.display(), "Credential file written");
    Ok(())
}

#[async_trait]
impl KeyValueStorePort for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key]).await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
            true
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|map| {
            let mut changed = false;
            for key in keys {
                changed |= map.remove(*key).is_some();
            }
            changed
        })
        .await
    }
}
