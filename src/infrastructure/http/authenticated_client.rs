//! Authenticated request client with one-shot token refresh.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::services::SessionManager;
use crate::domain::entities::{AUTHORIZATION, AccessToken, ApiResponse, RequestDescriptor};
use crate::domain::errors::{ApiError, TransportError};
use crate::domain::ports::{AuthPort, Transport};

/// Sends requests with the session's bearer token attached.
///
/// A 401 on a descriptor that has not been retried triggers exactly one
/// refresh followed by one resend. Refresh attempts are serialized; a caller
/// that waited on another caller's refresh reuses its token instead of
/// refreshing again.
///
/// Header rule: an `Authorization` header set by the caller is sent verbatim
/// on the first attempt. The retry always carries the refreshed token.
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthPort>,
    session: Arc<SessionManager>,
    refresh_gate: Mutex<()>,
}

impl AuthenticatedClient {
    /// Creates new client.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthPort>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            transport,
            auth,
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Returns the session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Sends `request` and returns the response body.
    ///
    /// # Errors
    /// Returns `Http` for non-2xx answers (including a second 401),
    /// `Network` when no answer arrived, and the refresh failure when a
    /// refresh was needed and failed.
    pub async fn request(&self, request: RequestDescriptor) -> Result<Value, ApiError> {
        if !request.is_relative() {
            warn!(path = request.path(), "Refusing to send credentials outside the API");
            return Err(ApiError::from(TransportError::request(format!(
                "path must be relative to the API base URL: {}",
                request.path()
            ))));
        }
        let (outgoing, sent_token) = self.authorize(request);

        let response = self.send(&outgoing).await?;
        if response.is_success() {
            return Ok(response.body);
        }
        if !response.is_unauthorized() || outgoing.is_retried() {
            return Err(ApiError::http(response.status, response.body));
        }

        debug!(
            method = %outgoing.method(),
            path = outgoing.path(),
            "Access token rejected, refreshing"
        );
        let fresh = self.refresh_after(sent_token.as_ref()).await?;

        let retry = outgoing
            .into_retry()
            .with_header(AUTHORIZATION, fresh.bearer_header());
        let response = self.send(&retry).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(ApiError::http(response.status, response.body))
        }
    }

    /// Sends `request` and decodes the response body.
    ///
    /// # Errors
    /// Returns the errors of [`Self::request`], or `Decode` when the body
    /// does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let body = self.request(request).await?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::decode(format!("failed to parse response: {e}")))
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// # Errors
    /// Returns `SessionEnded` when the refresh token is missing or rejected
    /// (credentials are cleared), or `RefreshFailed` for any other failure
    /// (credentials are untouched).
    pub async fn refresh(&self) -> Result<AccessToken, ApiError> {
        let _guard = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Attaches the session token unless the caller supplied one.
    fn authorize(&self, request: RequestDescriptor) -> (RequestDescriptor, Option<AccessToken>) {
        if request.header(AUTHORIZATION).is_some() {
            return (request, None);
        }
        match self.session.current_access_token() {
            Some(token) => (
                request.with_header(AUTHORIZATION, token.bearer_header()),
                Some(token),
            ),
            None => (request, None),
        }
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(method = %request.method(), path = request.path(), error = %e, "Request failed");
            ApiError::from(e)
        })?;

        debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status,
            retried = request.is_retried(),
            "Request completed"
        );
        Ok(response)
    }

    /// Refreshes unless another caller already replaced `rejected`.
    async fn refresh_after(&self, rejected: Option<&AccessToken>) -> Result<AccessToken, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        if let (Some(rejected), Some(current)) = (rejected, self.session.current_access_token())
            && &current != rejected
        {
            debug!(token = %current.masked(), "Reusing token refreshed by a concurrent request");
            return Ok(current);
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<AccessToken, ApiError> {
        let Some(refresh) = self.session.refresh_token() else {
            warn!("No refresh token available, session ended");
            self.end_session().await;
            return Err(ApiError::SessionEnded { status: None });
        };

        match self.auth.refresh_access_token(&refresh).await {
            Ok(access) => {
                if !self.session.apply_refresh(access.clone()).await? {
                    warn!("Session was cleared during refresh");
                    return Err(ApiError::SessionEnded { status: None });
                }
                info!(token = %access.masked(), "Access token refreshed");
                Ok(access)
            }
            Err(error) => Err(self.classify_refresh_failure(error).await),
        }
    }

    async fn classify_refresh_failure(&self, error: ApiError) -> ApiError {
        match error.status() {
            Some(status @ (401 | 403)) => {
                warn!(status, "Refresh token rejected, session ended");
                self.end_session().await;
                ApiError::SessionEnded {
                    status: Some(status),
                }
            }
            status => {
                let message = error
                    .detail()
                    .map_or_else(|| error.to_string(), ToString::to_string);
                warn!(?status, %message, "Token refresh failed, keeping credentials");
                ApiError::RefreshFailed { status, message }
            }
        }
    }

    async fn end_session(&self) {
        if let Err(e) = self.session.clear().await {
            tracing::error!(error = %e, "Failed to remove stored credentials");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, RefreshToken, TokenPair, USER_PROFILE_KEY,
        UserProfile,
    };
    use crate::domain::ports::KeyValueStorePort;
    use crate::domain::ports::mocks::{MockTransport, respond};
    use crate::infrastructure::http::{REFRESH_PATH, TokenApi};
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const BATCHES: &str = "/batches/";

    struct Fixture {
        store: MemoryKeyValueStore,
        session: Arc<SessionManager>,
        transport: Arc<MockTransport>,
        client: AuthenticatedClient,
    }

    /// Logged in as T1/R1 with `remember` set, profile cached.
    async fn fixture(transport: MockTransport) -> Fixture {
        let store = MemoryKeyValueStore::new();
        let session = Arc::new(SessionManager::new(
            Arc::new(store.clone()),
            Arc::new(MemoryKeyValueStore::new()),
        ));
        session
            .establish(
                TokenPair::new(
                    AccessToken::new_unchecked("T1"),
                    RefreshToken::new_unchecked("R1"),
                ),
                true,
            )
            .await
            .unwrap();
        let profile: UserProfile = serde_json::from_value(json!({"id": 1, "username": "alice"})).unwrap();
        session.set_profile(profile).await.unwrap();

        let transport = Arc::new(transport);
        let client = AuthenticatedClient::new(
            transport.clone(),
            Arc::new(TokenApi::new(transport.clone())),
            session.clone(),
        );

        Fixture {
            store,
            session,
            transport,
            client,
        }
    }

    fn batches() -> Value {
        json!([{"batch_id": 1, "status": "draft"}])
    }

    /// Backend where T1 is expired, T2 is valid and refresh answers `refresh`.
    fn backend(
        refresh: impl Fn() -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) -> MockTransport {
        MockTransport::new(move |request| {
            if request.path() == REFRESH_PATH {
                return refresh();
            }
            match request.header(AUTHORIZATION) {
                Some("Bearer T2") => respond(200, batches()),
                _ => respond(401, json!({"detail": "Given token not valid for any token type"})),
            }
        })
    }

    fn refresh_ok() -> Result<ApiResponse, TransportError> {
        respond(200, json!({"access": "T2"}))
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried() {
        let fx = fixture(backend(refresh_ok)).await;

        let body = assert_ok!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert_eq!(body, batches());
        assert_eq!(fx.store.peek(ACCESS_TOKEN_KEY).as_deref(), Some("T2"));
        assert_eq!(fx.store.peek(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
        assert_eq!(fx.session.current_access_token().unwrap().as_str(), "T2");

        let sent = fx.transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].header(AUTHORIZATION), Some("Bearer T1"));
        assert_eq!(sent[1].path(), REFRESH_PATH);
        assert_eq!(sent[1].body(), Some(&json!({"refresh": "R1"})));
        assert_eq!(sent[2].header(AUTHORIZATION), Some("Bearer T2"));
        assert!(sent[2].is_retried());
    }

    #[tokio::test]
    async fn test_rejected_refresh_ends_session() {
        let fx = fixture(backend(|| respond(403, json!({"detail": "forbidden"})))).await;

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::SessionEnded { status: Some(403) }));
        assert!(error.is_session_ended());
        assert!(fx.store.peek(ACCESS_TOKEN_KEY).is_none());
        assert!(fx.store.peek(REFRESH_TOKEN_KEY).is_none());
        assert!(fx.store.peek(USER_PROFILE_KEY).is_none());
        assert!(!fx.session.is_authenticated());
        assert!(fx.session.profile().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_refresh_keeps_credentials() {
        let fx = fixture(backend(|| Err(TransportError::connect("connection refused")))).await;

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::RefreshFailed { status: None, .. }));
        assert!(error.is_retryable());
        assert_eq!(fx.store.peek(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(fx.store.peek(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
        assert!(fx.session.profile().is_some());
    }

    #[tokio::test]
    async fn test_refresh_server_error_keeps_credentials() {
        let fx = fixture(backend(|| respond(502, json!("Bad Gateway")))).await;

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::RefreshFailed { status: Some(502), .. }));
        assert_eq!(fx.session.current_access_token().unwrap().as_str(), "T1");
        assert_eq!(fx.store.peek(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_surfaced() {
        let fx = fixture(MockTransport::new(|request| {
            if request.path() == REFRESH_PATH {
                refresh_ok()
            } else {
                respond(401, json!({"detail": "nope"}))
            }
        }))
        .await;

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::Http { status: 401, .. }));
        assert_eq!(fx.transport.sent_to(REFRESH_PATH), 1);
        assert_eq!(fx.transport.sent_to(BATCHES), 2);
        assert!(fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_retried_descriptor_is_not_retried_again() {
        let fx = fixture(backend(refresh_ok)).await;

        let error = assert_err!(
            fx.client
                .request(RequestDescriptor::get(BATCHES).into_retry())
                .await
        );

        assert!(error.is_unauthorized());
        assert_eq!(fx.transport.sent_to(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_foreign_url_is_refused_without_sending() {
        let fx = fixture(MockTransport::new(|_| respond(200, batches()))).await;

        let error = assert_err!(
            fx.client
                .request(RequestDescriptor::get("https://evil.example/x/"))
                .await
        );

        assert!(matches!(error, ApiError::Network { .. }));
        assert!(fx.transport.sent().is_empty());
        assert!(fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_success_never_refreshes() {
        let fx = fixture(MockTransport::new(|_| respond(200, batches()))).await;

        let body = assert_ok!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert_eq!(body, batches());
        assert_eq!(fx.transport.sent().len(), 1);
        assert_eq!(fx.store.peek(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(fx.store.peek(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_caller_authorization_sent_verbatim_first() {
        let fx = fixture(backend(refresh_ok)).await;

        let request = RequestDescriptor::get(BATCHES).with_header("authorization", "Token custom");
        assert_ok!(fx.client.request(request).await);

        let sent = fx.transport.sent();
        assert_eq!(sent[0].header(AUTHORIZATION), Some("Token custom"));
        assert_eq!(sent[2].header(AUTHORIZATION), Some("Bearer T2"));
    }

    #[tokio::test]
    async fn test_other_caller_headers_pass_through() {
        let fx = fixture(MockTransport::new(|_| respond(204, Value::Null))).await;

        let request = RequestDescriptor::delete("/bags/4/").with_header("X-Request-Id", "abc");
        let body = assert_ok!(fx.client.request(request).await);

        assert!(body.is_null());
        let sent = fx.transport.sent();
        assert_eq!(sent[0].header("x-request-id"), Some("abc"));
        assert_eq!(sent[0].header(AUTHORIZATION), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn test_other_failures_are_unchanged() {
        let fx = fixture(MockTransport::new(|_| {
            respond(400, json!({"quantity": ["Quantity must be positive"]}))
        }))
        .await;

        let error = assert_err!(fx.client.request(RequestDescriptor::post(BATCHES)).await);

        assert_eq!(error.status(), Some(400));
        assert_eq!(error.payload(), Some(&json!({"quantity": ["Quantity must be positive"]})));
        assert_eq!(fx.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let fx = fixture(MockTransport::scripted(vec![Err(TransportError::timeout("30s"))])).await;

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::Network { .. }));
        assert!(fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logged_out_unauthorized_ends_session() {
        let fx = fixture(backend(refresh_ok)).await;
        fx.session.clear().await.unwrap();

        let error = assert_err!(fx.client.request(RequestDescriptor::get(BATCHES)).await);

        assert!(matches!(error, ApiError::SessionEnded { status: None }));
        let sent = fx.transport.sent();
        assert!(sent[0].header(AUTHORIZATION).is_none());
        assert_eq!(fx.transport.sent_to(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_refresh() {
        let fx = fixture(backend(refresh_ok)).await;

        let (first, second) = tokio::join!(
            fx.client.request(RequestDescriptor::get(BATCHES)),
            fx.client.request(RequestDescriptor::get(BATCHES)),
        );

        assert_eq!(assert_ok!(first), batches());
        assert_eq!(assert_ok!(second), batches());
        assert_eq!(fx.transport.sent_to(REFRESH_PATH), 1);
        assert_eq!(fx.transport.sent_to(BATCHES), 4);
    }

    #[tokio::test]
    async fn test_concurrent_requests_after_rejected_refresh_all_end() {
        let fx = fixture(backend(|| respond(401, json!({"code": "token_not_valid"})))).await;

        let results = futures_util::future::join_all(
            (0..3).map(|_| fx.client.request(RequestDescriptor::get(BATCHES))),
        )
        .await;

        assert!(results.iter().all(|r| matches!(r, Err(ApiError::SessionEnded { .. }))));
        assert_eq!(fx.transport.sent_to(REFRESH_PATH), 1);
        assert!(!fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_explicit_refresh() {
        let fx = fixture(backend(refresh_ok)).await;

        let token = assert_ok!(fx.client.refresh().await);

        assert_eq!(token.as_str(), "T2");
        assert_eq!(fx.store.peek(ACCESS_TOKEN_KEY).as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_refresh_writes_session_scope_when_not_remembered() {
        let persistent = MemoryKeyValueStore::new();
        let scoped = MemoryKeyValueStore::new();
        let session = Arc::new(SessionManager::new(
            Arc::new(persistent.clone()),
            Arc::new(scoped.clone()),
        ));
        scoped
            .set_many(&[(ACCESS_TOKEN_KEY, "T1"), (REFRESH_TOKEN_KEY, "R1")])
            .await
            .unwrap();
        session.hydrate().await.unwrap();

        let transport = Arc::new(backend(refresh_ok));
        let client = AuthenticatedClient::new(
            transport.clone(),
            Arc::new(TokenApi::new(transport)),
            session,
        );

        assert_ok!(client.request(RequestDescriptor::get(BATCHES)).await);

        assert_eq!(scoped.peek(ACCESS_TOKEN_KEY).as_deref(), Some("T2"));
        assert!(persistent.peek(ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_request_json_decodes() {
        #[derive(serde::Deserialize)]
        struct Row {
            batch_id: u64,
        }

        let fx = fixture(MockTransport::new(|_| respond(200, batches()))).await;

        let rows: Vec<Row> = assert_ok!(fx.client.request_json(RequestDescriptor::get(BATCHES)).await);
        assert_eq!(rows[0].batch_id, 1);

        let result: Result<Vec<String>, _> =
            fx.client.request_json(RequestDescriptor::get(BATCHES)).await;
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }
}
