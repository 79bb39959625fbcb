//! Session restoration use case.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::RestoredSession;
use crate::domain::entities::{RequestDescriptor, UserProfile};
use crate::domain::errors::ApiError;
use crate::infrastructure::http::{AuthenticatedClient, ME_PATH};

/// Picks up a session stored by an earlier run.
pub struct RestoreSessionUseCase {
    client: Arc<AuthenticatedClient>,
}

impl RestoreSessionUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Loads stored credentials and makes sure a profile is cached.
    ///
    /// The profile is fetched through the authenticated client, so an
    /// expired access token is refreshed on the way. A transient failure
    /// keeps the session without a profile.
    ///
    /// # Errors
    /// Returns error if storage cannot be read, or `SessionEnded` when the
    /// stored refresh token is no longer accepted.
    pub async fn execute(&self) -> Result<Option<RestoredSession>, ApiError> {
        let session = self.client.session();

        if !session.hydrate().await? {
            debug!("No stored session found");
            return Ok(None);
        }

        if session.profile().is_none() {
            debug!("Stored session has no profile, fetching it");
            match self
                .client
                .request_json::<UserProfile>(RequestDescriptor::get(ME_PATH))
                .await
            {
                Ok(profile) => session.set_profile(profile).await?,
                Err(e) if e.is_session_ended() => return Err(e),
                Err(e) => warn!(error = %e, "Could not fetch user profile"),
            }
        }

        info!(remember = session.remember(), "Restored stored session");
        Ok(Some(RestoredSession {
            profile: session.profile(),
            remember: session.remember(),
        }))
    }
}
