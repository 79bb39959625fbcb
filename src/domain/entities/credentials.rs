//! Session credentials and cached user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::token::{AccessToken, RefreshToken, TokenPair};

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the serialized user profile.
pub const USER_PROFILE_KEY: &str = "user";
/// Storage key for the remember preference. Always kept in the persistent scope.
pub const REMEMBER_KEY: &str = "rememberMe";

/// Keys cleared on logout.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_PROFILE_KEY];

/// Where credentials are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Survives restarts.
    Persistent,
    /// Discarded when the login session ends.
    Session,
}

impl StorageScope {
    /// Selects the scope for a remember preference.
    #[must_use]
    pub const fn for_remember(remember: bool) -> Self {
        if remember {
            Self::Persistent
        } else {
            Self::Session
        }
    }

    /// Returns the opposite scope.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Persistent => Self::Session,
            Self::Session => Self::Persistent,
        }
    }
}

impl std::fmt::Display for StorageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Both bearer tokens of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    access: AccessToken,
    refresh: RefreshToken,
}

impl SessionCredentials {
    /// Creates credentials from both tokens.
    #[must_use]
    pub const fn new(access: AccessToken, refresh: RefreshToken) -> Self {
        Self { access, refresh }
    }

    /// Returns the access token.
    #[must_use]
    pub const fn access(&self) -> &AccessToken {
        &self.access
    }

    /// Returns the refresh token.
    #[must_use]
    pub const fn refresh(&self) -> &RefreshToken {
        &self.refresh
    }

    /// Returns a copy holding a new access token.
    #[must_use]
    pub fn with_access(&self, access: AccessToken) -> Self {
        Self {
            access,
            refresh: self.refresh.clone(),
        }
    }
}

impl From<TokenPair> for SessionCredentials {
    fn from(pair: TokenPair) -> Self {
        Self::new(pair.access, pair.refresh)
    }
}

/// User record returned by the identity endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Wraps a raw JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the user id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    /// Returns whether the user is staff.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.0
            .get("is_staff")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns a raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_for_remember() {
        assert_eq!(StorageScope::for_remember(true), StorageScope::Persistent);
        assert_eq!(StorageScope::for_remember(false), StorageScope::Session);
        assert_eq!(StorageScope::Session.other(), StorageScope::Persistent);
    }

    #[test]
    fn test_with_access_keeps_refresh() {
        let creds = SessionCredentials::new(
            AccessToken::new_unchecked("T1"),
            RefreshToken::new_unchecked("R1"),
        );
        let updated = creds.with_access(AccessToken::new_unchecked("T2"));

        assert_eq!(updated.access().as_str(), "T2");
        assert_eq!(updated.refresh().as_str(), "R1");
    }

    #[test]
    fn test_profile_accessors() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "username": "alice",
            "is_staff": true,
            "email": "alice@example.com"
        }))
        .unwrap();

        assert_eq!(profile.id(), Some(7));
        assert_eq!(profile.username(), Some("alice"));
        assert!(profile.is_staff());
        assert_eq!(profile.get("email"), Some(&json!("alice@example.com")));
    }

    #[test]
    fn test_profile_roundtrips_as_plain_object() {
        let profile = UserProfile::new(json!({"id": 1}).as_object().cloned().unwrap());
        assert_eq!(serde_json::to_string(&profile).unwrap(), r#"{"id":1}"#);
    }
}
