//! Authentication DTOs.

use crate::domain::entities::UserProfile;
use crate::domain::errors::FieldErrors;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Login request data.
#[derive(Clone)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Whether the session should outlive the current login session.
    pub remember: bool,
}

impl LoginRequest {
    /// Creates new login request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember: false,
        }
    }

    /// Keeps the session across restarts.
    #[must_use]
    pub const fn remembered(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    /// Checks the form before anything is sent.
    ///
    /// # Errors
    /// Returns per-field messages for a missing username or a short password.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.username.trim().is_empty() {
            errors.insert("username", "Username is required");
        }

        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.insert(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        errors.into_result()
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Login response data.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Authenticated user, when the identity endpoint answered.
    pub profile: Option<UserProfile>,
    /// Whether the session was stored persistently.
    pub remember: bool,
}

impl LoginResponse {
    /// Creates new login response.
    #[must_use]
    pub const fn new(profile: Option<UserProfile>, remember: bool) -> Self {
        Self { profile, remember }
    }
}

/// Session found in storage at startup.
#[derive(Debug, Clone)]
pub struct RestoredSession {
    /// Authenticated user, when known.
    pub profile: Option<UserProfile>,
    /// Whether the session was stored persistently.
    pub remember: bool,
}
