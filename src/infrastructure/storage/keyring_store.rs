//! Keyring-based key/value store.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;

const KEYRING_SERVICE: &str = "batchtrack";

/// System keyring store. Each key becomes one keyring entry.
pub struct KeyringKeyValueStore {
    service: String,
}

impl KeyringKeyValueStore {
    /// Creates new store with the default service name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Creates store with a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service, key)
            .map_err(|e| StorageError::AccessFailed(format!("failed to access keyring: {e}")))
    }
}

impl Default for KeyringKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorePort for KeyringKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!(service = %self.service, key, "Reading keyring entry");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                warn!(error = %e, key, "Failed to read keyring entry");
                Err(StorageError::ReadFailed(e.to_string()))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(service = %self.service, key, "Writing keyring entry");

        self.entry(key)?.set_password(value).map_err(|e| {
            warn!(error = %e, key, "Failed to write keyring entry");
            StorageError::WriteFailed(e.to_string())
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!(error = %e, key, "Failed to delete keyring entry");
                Err(StorageError::DeletionFailed(e.to_string()))
            }
        }
    }
}
