//! Token and identity endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{RefreshRequest, RefreshResponse, TokenRequest, TokenResponse};
use crate::domain::entities::{
    AUTHORIZATION, AccessToken, ApiResponse, RefreshToken, RequestDescriptor, TokenPair,
    UserProfile,
};
use crate::domain::errors::ApiError;
use crate::domain::ports::{AuthPort, Transport};

/// Path of the login endpoint.
pub const TOKEN_PATH: &str = "/token/";
/// Path of the refresh endpoint.
pub const REFRESH_PATH: &str = "/token/refresh/";
/// Path of the identity endpoint.
pub const ME_PATH: &str = "/me/";

/// Talks to the token endpoints directly, without the refresh policy.
pub struct TokenApi {
    transport: Arc<dyn Transport>,
}

impl TokenApi {
    /// Creates API over `transport`.
    #[must_use]
    pub const fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn call(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(&request).await.map_err(|e| {
            warn!(path = request.path(), error = %e, "Token endpoint unreachable");
            ApiError::from(e)
        })?;

        debug!(path = request.path(), status = response.status, "Token endpoint answered");
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::http(response.status, response.body));
    }
    serde_json::from_value(response.body)
        .map_err(|e| ApiError::decode(format!("failed to parse response: {e}")))
}

fn invalid_token(kind: &str) -> ApiError {
    ApiError::decode(format!("server returned an invalid {kind} token"))
}

#[async_trait]
impl AuthPort for TokenApi {
    async fn obtain_tokens(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let request = RequestDescriptor::post(TOKEN_PATH)
            .with_json(&TokenRequest { username, password })
            .map_err(|e| ApiError::unexpected(e.to_string()))?;

        let response = self.call(request).await?;
        if matches!(response.status, 400 | 401) {
            return Err(ApiError::InvalidCredentials);
        }

        let tokens: TokenResponse = decode(response)?;
        Ok(TokenPair::new(
            AccessToken::new(tokens.access).ok_or_else(|| invalid_token("access"))?,
            RefreshToken::new(tokens.refresh).ok_or_else(|| invalid_token("refresh"))?,
        ))
    }

    async fn refresh_access_token(&self, refresh: &RefreshToken) -> Result<AccessToken, ApiError> {
        let request = RequestDescriptor::post(REFRESH_PATH)
            .with_json(&RefreshRequest {
                refresh: refresh.as_str(),
            })
            .map_err(|e| ApiError::unexpected(e.to_string()))?;

        let refreshed: RefreshResponse = decode(self.call(request).await?)?;
        AccessToken::new(refreshed.access).ok_or_else(|| invalid_token("access"))
    }

    async fn fetch_profile(&self, access: &AccessToken) -> Result<UserProfile, ApiError> {
        let request = RequestDescriptor::get(ME_PATH).with_header(AUTHORIZATION, access.bearer_header());
        decode(self.call(request).await?)
    }
}
