//! Credential key/value store adapters.

mod file_store;
#[cfg(feature = "keyring")]
mod keyring_store;
#[cfg(not(feature = "keyring"))]
mod keyring_store_stub;
mod memory_store;

pub use file_store::FileKeyValueStore;
#[cfg(feature = "keyring")]
pub use keyring_store::KeyringKeyValueStore;
#[cfg(not(feature = "keyring"))]
pub use keyring_store_stub::KeyringKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
