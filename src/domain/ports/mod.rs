mod auth_port;
mod key_value_store_port;
mod transport_port;

pub use auth_port::AuthPort;
pub use key_value_store_port::KeyValueStorePort;
pub use transport_port::Transport;
