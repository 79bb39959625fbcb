//! Application layer with session state, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Application services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoginRequest, LoginResponse, RestoredSession};
pub use services::SessionManager;
pub use use_cases::{LoginUseCase, RestoreSessionUseCase};
