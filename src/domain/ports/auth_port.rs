//! Authentication port definition.

use async_trait::async_trait;

use crate::domain::entities::{AccessToken, RefreshToken, TokenPair, UserProfile};
use crate::domain::errors::ApiError;

/// Port for the token and identity endpoints.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges username and password for a token pair.
    async fn obtain_tokens(&self, username: &str, password: &str) -> Result<TokenPair, ApiError>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh_access_token(&self, refresh: &RefreshToken) -> Result<AccessToken, ApiError>;

    /// Fetches the profile of the token's owner.
    async fn fetch_profile(&self, access: &AccessToken) -> Result<UserProfile, ApiError>;
}
