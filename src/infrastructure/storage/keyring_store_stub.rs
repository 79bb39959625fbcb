//! Stub keyring store for builds without keyring support.

use async_trait::async_trait;

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;

const UNAVAILABLE: &str = "built without the `keyring` feature";

/// Stub store that rejects every operation.
pub struct KeyringKeyValueStore;

impl KeyringKeyValueStore {
    /// Creates new stub store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Creates stub store (service name ignored).
    #[must_use]
    pub fn with_service(_service: impl Into<String>) -> Self {
        Self
    }
}

impl Default for KeyringKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorePort for KeyringKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::NotAvailable(UNAVAILABLE.to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::NotAvailable(UNAVAILABLE.to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::NotAvailable(UNAVAILABLE.to_string()))
    }
}
