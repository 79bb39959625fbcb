//! Domain error types.

mod api_error;
mod field_errors;
mod storage_error;
mod transport_error;

pub use api_error::ApiError;
pub use field_errors::FieldErrors;
pub use storage_error::StorageError;
pub use transport_error::TransportError;
