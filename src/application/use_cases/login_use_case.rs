//! Login use case implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{LoginRequest, LoginResponse};
use crate::application::services::SessionManager;
use crate::domain::errors::ApiError;
use crate::domain::ports::AuthPort;

/// Handles user authentication workflow.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    session: Arc<SessionManager>,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(auth_port: Arc<dyn AuthPort>, session: Arc<SessionManager>) -> Self {
        Self { auth_port, session }
    }

    /// Executes login with provided request.
    ///
    /// A failing identity endpoint does not undo the login; the response
    /// then carries no profile.
    ///
    /// # Errors
    /// Returns error if the form is invalid, the credentials are rejected or
    /// the tokens cannot be stored.
    pub async fn execute(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        request.validate()?;
        debug!(username = %request.username, remember = request.remember, "Attempting login");

        let tokens = self
            .auth_port
            .obtain_tokens(request.username.trim(), &request.password)
            .await
            .inspect_err(|e| warn!(error = %e, "Login rejected"))?;

        let access = tokens.access.clone();
        self.session.establish(tokens, request.remember).await?;

        let profile = match self.auth_port.fetch_profile(&access).await {
            Ok(profile) => {
                if let Err(e) = self.session.set_profile(profile.clone()).await {
                    tracing::error!(error = %e, "Failed to cache user profile");
                }
                Some(profile)
            }
            Err(e) => {
                warn!(error = %e, "Logged in but the user profile could not be fetched");
                None
            }
        };

        info!(
            username = profile.as_ref().and_then(|p| p.username()).unwrap_or("<unknown>"),
            remember = request.remember,
            "Successfully authenticated"
        );

        Ok(LoginResponse::new(profile, request.remember))
    }

    /// Ends the current session.
    ///
    /// # Errors
    /// Returns error if stored credentials cannot be removed.
    pub async fn logout(&self) -> Result<(), ApiError> {
        debug!("Logging out");
        self.session.clear().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to remove stored credentials");
            ApiError::from(e)
        })
    }
}
