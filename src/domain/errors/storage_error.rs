//! Credential storage error types.

use thiserror::Error;

/// Key/value store error variants.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access credential storage: {0}")]
    AccessFailed(String),

    #[error("failed to read stored value: {0}")]
    ReadFailed(String),

    #[error("failed to write stored value: {0}")]
    WriteFailed(String),

    #[error("failed to delete stored value: {0}")]
    DeletionFailed(String),

    #[error("credential storage not available: {0}")]
    NotAvailable(String),
}
