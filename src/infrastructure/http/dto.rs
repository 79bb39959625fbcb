//! Wire types of the token endpoints.

use serde::{Deserialize, Serialize};

/// Body of the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    /// Account name.
    pub username: &'a str,
    /// Account password.
    pub password: &'a str,
}

/// Token endpoint response structure.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Short-lived access token.
    pub access: String,
    /// Long-lived refresh token.
    pub refresh: String,
}

/// Body of the refresh endpoint.
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    /// Stored refresh token.
    pub refresh: &'a str,
}

/// Refresh endpoint response structure.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    /// Replacement access token.
    pub access: String,
}
