//! Use case implementations.

mod login_use_case;
mod restore_session_use_case;

pub use login_use_case::LoginUseCase;
pub use restore_session_use_case::RestoreSessionUseCase;
