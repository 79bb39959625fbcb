//! Key/value store port definition.

use async_trait::async_trait;

use crate::domain::errors::StorageError;

/// Flat string storage for one credential scope.
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Writes several values. Stores that can do so write them in one step.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Removes several values.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
