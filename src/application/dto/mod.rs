//! Data transfer objects for the application layer.

mod auth_dto;

pub use auth_dto::{LoginRequest, LoginResponse, MIN_PASSWORD_LENGTH, RestoredSession};
