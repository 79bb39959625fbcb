//! Owner of the process-wide session credentials.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    ACCESS_TOKEN_KEY, AccessToken, REFRESH_TOKEN_KEY, REMEMBER_KEY, RefreshToken, SESSION_KEYS,
    SessionCredentials, StorageScope, TokenPair, USER_PROFILE_KEY, UserProfile,
};
use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValueStorePort;

#[derive(Debug, Clone, Default)]
struct SessionSnapshot {
    credentials: Option<SessionCredentials>,
    profile: Option<UserProfile>,
    remember: bool,
}

/// Reads and mutates session credentials.
///
/// The in-memory snapshot is authoritative and is replaced in a single step,
/// so readers always observe both tokens or neither. Storage is written
/// before the snapshot changes; `clear` is the exception and drops the
/// snapshot first so a failing store can never keep a session alive.
pub struct SessionManager {
    persistent: Arc<dyn KeyValueStorePort>,
    session: Arc<dyn KeyValueStorePort>,
    state: RwLock<SessionSnapshot>,
}

impl SessionManager {
    /// Creates manager over the two storage scopes.
    #[must_use]
    pub fn new(
        persistent: Arc<dyn KeyValueStorePort>,
        session: Arc<dyn KeyValueStorePort>,
    ) -> Self {
        Self {
            persistent,
            session,
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    fn store(&self, scope: StorageScope) -> &Arc<dyn KeyValueStorePort> {
        match scope {
            StorageScope::Persistent => &self.persistent,
            StorageScope::Session => &self.session,
        }
    }

    fn current_scope(&self) -> StorageScope {
        StorageScope::for_remember(self.state.read().remember)
    }

    /// Loads stored credentials into memory.
    ///
    /// Returns whether a complete session was found. A stored state with only
    /// one token is discarded.
    ///
    /// # Errors
    /// Returns error if a store cannot be read.
    pub async fn hydrate(&self) -> Result<bool, StorageError> {
        let remember = self
            .persistent
            .get(REMEMBER_KEY)
            .await?
            .is_some_and(|value| value == "true");
        let scope = StorageScope::for_remember(remember);
        let store = self.store(scope);

        let access = store.get(ACCESS_TOKEN_KEY).await?.and_then(AccessToken::new);
        let refresh = store.get(REFRESH_TOKEN_KEY).await?.and_then(RefreshToken::new);

        let snapshot = match (access, refresh) {
            (Some(access), Some(refresh)) => {
                let profile = store.get(USER_PROFILE_KEY).await?.and_then(|raw| {
                    serde_json::from_str::<UserProfile>(&raw)
                        .map_err(|e| warn!(error = %e, "Stored profile is malformed, dropping it"))
                        .ok()
                });

                debug!(%scope, has_profile = profile.is_some(), "Restored stored session");
                SessionSnapshot {
                    credentials: Some(SessionCredentials::new(access, refresh)),
                    profile,
                    remember,
                }
            }
            (None, None) => {
                debug!(%scope, "No stored session");
                SessionSnapshot {
                    remember,
                    ..SessionSnapshot::default()
                }
            }
            _ => {
                warn!(%scope, "Stored session is incomplete, discarding it");
                store.remove_many(&SESSION_KEYS).await?;
                SessionSnapshot {
                    remember,
                    ..SessionSnapshot::default()
                }
            }
        };

        let authenticated = snapshot.credentials.is_some();
        *self.state.write() = snapshot;
        Ok(authenticated)
    }

    /// Starts a session after a successful login.
    ///
    /// Tokens go to the scope selected by `remember`, the other scope is
    /// wiped, and the preference itself is always written to the persistent
    /// scope.
    ///
    /// # Errors
    /// Returns error if a store cannot be written.
    pub async fn establish(&self, tokens: TokenPair, remember: bool) -> Result<(), StorageError> {
        let scope = StorageScope::for_remember(remember);
        let target = self.store(scope);

        target
            .set_many(&[
                (ACCESS_TOKEN_KEY, tokens.access.as_str()),
                (REFRESH_TOKEN_KEY, tokens.refresh.as_str()),
            ])
            .await?;
        target.remove(USER_PROFILE_KEY).await?;
        self.store(scope.other()).remove_many(&SESSION_KEYS).await?;
        self.persistent
            .set(REMEMBER_KEY, if remember { "true" } else { "false" })
            .await?;

        *self.state.write() = SessionSnapshot {
            credentials: Some(tokens.into()),
            profile: None,
            remember,
        };

        info!(%scope, "Session established");
        Ok(())
    }

    /// Replaces the access token after a refresh.
    ///
    /// Returns `false` without touching anything when no session exists.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub async fn apply_refresh(&self, access: AccessToken) -> Result<bool, StorageError> {
        if !self.is_authenticated() {
            return Ok(false);
        }

        let scope = self.current_scope();
        self.store(scope)
            .set(ACCESS_TOKEN_KEY, access.as_str())
            .await?;

        let applied = {
            let mut state = self.state.write();
            let updated = state.credentials.as_ref().map(|c| c.with_access(access));
            let applied = updated.is_some();
            if applied {
                state.credentials = updated;
            }
            applied
        };

        if !applied {
            // Session was cleared while the token was being written.
            self.store(scope).remove(ACCESS_TOKEN_KEY).await?;
        }

        debug!(%scope, applied, "Access token replaced");
        Ok(applied)
    }

    /// Caches the user profile.
    ///
    /// # Errors
    /// Returns error if the profile cannot be serialized or stored.
    pub async fn set_profile(&self, profile: UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&profile)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        self.store(self.current_scope())
            .set(USER_PROFILE_KEY, &raw)
            .await?;

        self.state.write().profile = Some(profile);
        Ok(())
    }

    /// Drops the cached user profile.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub async fn clear_profile(&self) -> Result<(), StorageError> {
        self.state.write().profile = None;
        self.store(self.current_scope())
            .remove(USER_PROFILE_KEY)
            .await
    }

    /// Ends the session and wipes tokens and profile from both scopes.
    ///
    /// The remember preference is kept.
    ///
    /// # Errors
    /// Returns the first storage error; both scopes are always attempted.
    pub async fn clear(&self) -> Result<(), StorageError> {
        {
            let mut state = self.state.write();
            state.credentials = None;
            state.profile = None;
        }

        let persistent = self.persistent.remove_many(&SESSION_KEYS).await;
        let session = self.session.remove_many(&SESSION_KEYS).await;

        info!("Session cleared");
        persistent.and(session)
    }

    /// Returns the current access token.
    #[must_use]
    pub fn current_access_token(&self) -> Option<AccessToken> {
        self.state
            .read()
            .credentials
            .as_ref()
            .map(|c| c.access().clone())
    }

    /// Returns the current refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.state
            .read()
            .credentials
            .as_ref()
            .map(|c| c.refresh().clone())
    }

    /// Returns both tokens.
    #[must_use]
    pub fn credentials(&self) -> Option<SessionCredentials> {
        self.state.read().credentials.clone()
    }

    /// Returns the cached profile.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.state.read().profile.clone()
    }

    /// Returns the remember preference.
    #[must_use]
    pub fn remember(&self) -> bool {
        self.state.read().remember
    }

    /// Returns whether a session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().credentials.is_some()
    }
}
