//! Command execution and output rendering.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::application::dto::LoginRequest;
use crate::application::use_cases::LoginUseCase;
use crate::domain::entities::{
    BagDraft, BatchDraft, FormDraft, FormField, RecordStatus, SubmissionDraft, SubmissionQuery,
    UserProfile,
};
use crate::domain::errors::{ApiError, FieldErrors};
use crate::domain::ports::AuthPort;
use crate::domain::services::normalize_field_definition;
use crate::infrastructure::api::{ResourceApi, StatusRecord, TrackerApi};
use crate::infrastructure::config::{
    Command, ItemCommand, RecordCommand, ResourceCommand, SubmissionCommand,
};

/// Failures of a single command.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("{message}")]
    Locked { message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    fn locked(message: impl Into<String>) -> Self {
        Self::Locked {
            message: message.into(),
        }
    }

    /// Returns the message shown to the user.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Api(error) => render_api_error(error),
            other => other.to_string(),
        }
    }
}

fn render_field_list(fields: impl IntoIterator<Item = (String, String)>) -> String {
    let mut rendered = String::from("Please correct the following fields:");
    for (field, message) in fields {
        rendered.push_str(&format!("\n  {field}: {message}"));
    }
    rendered
}

/// Flattens a backend error payload such as `{"quantity": ["..."]}`.
fn payload_fields(payload: &Value) -> Option<Vec<(String, String)>> {
    let object = payload.as_object()?;
    if object.is_empty() || object.contains_key("detail") {
        return None;
    }

    let fields = object
        .iter()
        .map(|(field, value)| {
            let message = match value {
                Value::Array(messages) => messages
                    .iter()
                    .map(|m| m.as_str().map_or_else(|| m.to_string(), ToString::to_string))
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            (field.clone(), message)
        })
        .collect();
    Some(fields)
}

fn render_api_error(error: &ApiError) -> String {
    match error {
        ApiError::SessionEnded { .. } => {
            "Your session has ended. Please log in again with `batchtrack login`.".to_string()
        }
        ApiError::InvalidCredentials => "Invalid username or password.".to_string(),
        ApiError::Validation(fields) => render_field_list(
            fields
                .iter()
                .map(|(field, message)| (field.to_string(), message.to_string())),
        ),
        ApiError::Http { status: 400, payload: Some(payload) } if payload_fields(payload).is_some() => {
            render_field_list(payload_fields(payload).unwrap_or_default())
        }
        error if error.is_retryable() => {
            format!("{error}. This is probably temporary, please try again.")
        }
        error => match error.detail() {
            Some(detail) => format!("{error}: {detail}"),
            None => error.to_string(),
        },
    }
}

/// Reads `@path` arguments from disk, otherwise takes the argument as JSON.
fn read_json_arg(raw: &str) -> Result<Value, CommandError> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| CommandError::invalid_input(format!("not valid JSON: {e}")))
}

fn parse_json_arg<T: DeserializeOwned>(raw: &str) -> Result<T, CommandError> {
    serde_json::from_value(read_json_arg(raw)?)
        .map_err(|e| CommandError::invalid_input(e.to_string()))
}

fn validated(result: Result<(), FieldErrors>) -> Result<(), CommandError> {
    result.map_err(|errors| CommandError::Api(ApiError::Validation(errors)))
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::invalid_input(e.to_string()))?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

/// Drafts that can be checked locally before they are sent.
trait Draft: Serialize + DeserializeOwned + Send + Sync {
    async fn check(&mut self, api: &TrackerApi) -> Result<(), CommandError>;
}

impl Draft for BatchDraft {
    async fn check(&mut self, api: &TrackerApi) -> Result<(), CommandError> {
        let form = match self.form {
            Some(id) => Some(api.forms().get(id).await?),
            None => None,
        };
        validated(self.validate(form.as_ref()))
    }
}

impl Draft for BagDraft {
    async fn check(&mut self, api: &TrackerApi) -> Result<(), CommandError> {
        let form = match self.form {
            Some(id) => Some(api.forms().get(id).await?),
            None => None,
        };
        validated(self.validate(form.as_ref()))
    }
}

impl Draft for FormDraft {
    async fn check(&mut self, _api: &TrackerApi) -> Result<(), CommandError> {
        validated(self.validate())
    }
}

impl Draft for FormField {
    async fn check(&mut self, _api: &TrackerApi) -> Result<(), CommandError> {
        validated(normalize_field_definition(self))
    }
}

impl Draft for SubmissionDraft {
    async fn check(&mut self, api: &TrackerApi) -> Result<(), CommandError> {
        let form = api.forms().get(self.form).await?;
        validated(self.validate(&form))
    }
}

/// Runs parsed commands against the tracking API.
pub struct CommandRunner {
    login: LoginUseCase,
    api: TrackerApi,
}

impl CommandRunner {
    /// Creates runner sharing the session of `api`.
    #[must_use]
    pub fn new(auth: Arc<dyn AuthPort>, api: TrackerApi) -> Self {
        let session = Arc::clone(api.client().session());
        Self {
            login: LoginUseCase::new(auth, session),
            api,
        }
    }

    /// Executes `command`, writing results to `out`.
    ///
    /// # Errors
    /// Returns error if the command fails; see [`CommandError::render`].
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<(), CommandError> {
        match command {
            Command::Login {
                username,
                password,
                remember,
            } => {
                debug!(%username, remember, "Running login");
                let password = match password {
                    Some(password) => password,
                    None => prompt_password()?,
                };
                let response = self
                    .login
                    .execute(LoginRequest::new(username, password).remembered(remember))
                    .await?;
                let name = response
                    .profile
                    .as_ref()
                    .and_then(|p| p.username().map(ToString::to_string))
                    .unwrap_or_else(|| "unknown user".to_string());
                writeln!(out, "Logged in as {name}.")?;
            }
            Command::Logout => {
                self.login.logout().await?;
                writeln!(out, "Logged out.")?;
            }
            Command::Whoami => self.whoami(out).await?,
            Command::Refresh => {
                let token = self.api.client().refresh().await?;
                writeln!(out, "Access token refreshed ({}).", token.masked())?;
            }
            Command::Batches { action } => {
                self.record::<_, BatchDraft, _>(&self.api.batches(), action, out)
                    .await?;
            }
            Command::Bags { action } => {
                self.record::<_, BagDraft, _>(&self.api.bags(), action, out)
                    .await?;
            }
            Command::Forms { action } => {
                self.resource::<_, FormDraft, _>(&self.api.forms(), action, out)
                    .await?;
            }
            Command::FormFields { action } => {
                self.resource::<_, FormField, _>(&self.api.form_fields(), action, out)
                    .await?;
            }
            Command::Submissions { action } => match action {
                SubmissionCommand::List {
                    form,
                    association_type,
                } => {
                    let query = SubmissionQuery {
                        form,
                        association_type,
                    };
                    print_json(out, &self.api.list_submissions(&query).await?)?;
                }
                SubmissionCommand::Item(item) => {
                    self.item::<_, SubmissionDraft, _>(&self.api.submissions(), item, out)
                        .await?;
                }
            },
        }
        Ok(())
    }

    async fn whoami<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        if !self.api.client().session().is_authenticated() {
            writeln!(out, "Not logged in.")?;
            return Ok(());
        }
        print_json(out, &self.current_profile().await?)
    }

    /// Returns the cached profile, fetching it once if missing.
    async fn current_profile(&self) -> Result<UserProfile, CommandError> {
        let session = self.api.client().session();
        if let Some(profile) = session.profile() {
            return Ok(profile);
        }

        let profile = self.api.me().await?;
        session
            .set_profile(profile.clone())
            .await
            .map_err(ApiError::from)?;
        Ok(profile)
    }

    /// Refuses changes to completed records unless the user is staff.
    ///
    /// Bags of a completed batch are locked for everyone.
    async fn ensure_editable<T>(&self, api: &ResourceApi<T>, id: u64) -> Result<(), CommandError>
    where
        T: DeserializeOwned + StatusRecord,
    {
        let profile = self.current_profile().await?;
        let record = api.get(id).await?;
        let status = record.status();
        if !status.is_editable_by(Some(&profile)) {
            return Err(CommandError::locked(format!(
                "{}{id}/ is {status} and can only be changed by staff",
                api.collection()
            )));
        }

        if let Some(batch_id) = record.parent_batch() {
            let batch = self.api.batches().get(batch_id).await?;
            if batch.status == RecordStatus::Completed {
                return Err(CommandError::locked(format!(
                    "batch {batch_id} is completed, its bags can no longer be changed"
                )));
            }
        }
        Ok(())
    }

    async fn resource<T, D, W>(
        &self,
        api: &ResourceApi<T>,
        action: ResourceCommand,
        out: &mut W,
    ) -> Result<(), CommandError>
    where
        T: DeserializeOwned + Serialize,
        D: Draft,
        W: Write,
    {
        match action {
            ResourceCommand::List => print_json(out, &api.list().await?),
            ResourceCommand::Item(item) => self.item::<T, D, W>(api, item, out).await,
        }
    }

    async fn record<T, D, W>(
        &self,
        api: &ResourceApi<T>,
        action: RecordCommand,
        out: &mut W,
    ) -> Result<(), CommandError>
    where
        T: DeserializeOwned + Serialize + StatusRecord,
        D: Draft,
        W: Write,
    {
        match action {
            RecordCommand::List => print_json(out, &api.list().await?),
            RecordCommand::SetStatus { id, status } => {
                self.ensure_editable(api, id).await?;
                print_json(out, &api.set_status(id, status).await?)
            }
            RecordCommand::Item(item) => {
                if let ItemCommand::Update { id, .. } | ItemCommand::Patch { id, .. } = &item {
                    self.ensure_editable(api, *id).await?;
                }
                self.item::<T, D, W>(api, item, out).await
            }
        }
    }

    async fn item<T, D, W>(
        &self,
        api: &ResourceApi<T>,
        action: ItemCommand,
        out: &mut W,
    ) -> Result<(), CommandError>
    where
        T: DeserializeOwned + Serialize,
        D: Draft,
        W: Write,
    {
        match action {
            ItemCommand::Get { id } => print_json(out, &api.get(id).await?),
            ItemCommand::Create { json } => {
                let mut draft: D = parse_json_arg(&json)?;
                draft.check(&self.api).await?;
                print_json(out, &api.create(&draft).await?)
            }
            ItemCommand::Update { id, json } => {
                let mut draft: D = parse_json_arg(&json)?;
                draft.check(&self.api).await?;
                print_json(out, &api.update(id, &draft).await?)
            }
            ItemCommand::Patch { id, json } => {
                let changes = read_json_arg(&json)?;
                if !changes.is_object() {
                    return Err(CommandError::invalid_input("patch must be a JSON object"));
                }
                print_json(out, &api.partial_update(id, changes).await?)
            }
            ItemCommand::Delete { id } => {
                api.delete(id).await?;
                writeln!(out, "Deleted {}{id}/.", api.collection())?;
                Ok(())
            }
        }
    }
}

fn prompt_password() -> Result<String, CommandError> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SessionManager;
    use crate::domain::entities::{HttpMethod, REMEMBER_KEY};
    use crate::domain::ports::mocks::{MockAuthPort, MockTransport, respond};
    use crate::infrastructure::http::AuthenticatedClient;
    use crate::infrastructure::storage::MemoryKeyValueStore;
    use serde_json::json;

    struct Fixture {
        persistent: MemoryKeyValueStore,
        transport: Arc<MockTransport>,
        runner: CommandRunner,
    }

    fn fixture(transport: MockTransport) -> Fixture {
        let persistent = MemoryKeyValueStore::new();
        let session = Arc::new(SessionManager::new(
            Arc::new(persistent.clone()),
            Arc::new(MemoryKeyValueStore::new()),
        ));
        let transport = Arc::new(transport);
        let auth: Arc<dyn AuthPort> = Arc::new(MockAuthPort::new(true));
        let client = AuthenticatedClient::new(transport.clone(), auth.clone(), session);
        Fixture {
            persistent,
            transport,
            runner: CommandRunner::new(auth, TrackerApi::new(Arc::new(client))),
        }
    }

    async fn run(fx: &Fixture, command: Command) -> (Result<(), CommandError>, String) {
        let mut out = Vec::new();
        let result = fx.runner.run(command, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_login_then_whoami() {
        let fx = fixture(MockTransport::new(|_| respond(500, Value::Null)));

        let (result, out) = run(
            &fx,
            Command::Login {
                username: "testuser".into(),
                password: Some("secret1".into()),
                remember: true,
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(out, "Logged in as testuser.\n");
        assert_eq!(fx.persistent.peek(REMEMBER_KEY).as_deref(), Some("true"));

        let (result, out) = run(&fx, Command::Whoami).await;
        assert!(result.is_ok());
        assert!(out.contains("\"username\": \"testuser\""));
        assert!(fx.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_whoami_logged_out() {
        let fx = fixture(MockTransport::new(|_| respond(500, Value::Null)));

        let (result, out) = run(&fx, Command::Whoami).await;

        assert!(result.is_ok());
        assert_eq!(out, "Not logged in.\n");
    }

    #[tokio::test]
    async fn test_invalid_batch_is_not_sent() {
        let fx = fixture(MockTransport::new(|_| respond(201, json!({}))));

        let (result, _) = run(
            &fx,
            Command::Batches {
                action: RecordCommand::Item(ItemCommand::Create {
                    json: r#"{"country": "NL", "quantity": 0}"#.into(),
                }),
            },
        )
        .await;

        let error = result.unwrap_err();
        assert!(matches!(error, CommandError::Api(ApiError::Validation(_))));
        assert!(error.render().contains("quantity: Quantity must be positive"));
        assert!(fx.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_patch_requires_object() {
        let fx = fixture(MockTransport::new(|_| respond(200, json!({}))));

        let (result, _) = run(
            &fx,
            Command::Forms {
                action: ResourceCommand::Item(ItemCommand::Patch {
                    id: 1,
                    json: "[1, 2]".into(),
                }),
            },
        )
        .await;

        assert!(matches!(result, Err(CommandError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_delete_reports_path() {
        let fx = fixture(MockTransport::new(|_| respond(204, Value::Null)));

        let (result, out) = run(
            &fx,
            Command::Forms {
                action: ResourceCommand::Item(ItemCommand::Delete { id: 5 }),
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(out, "Deleted /forms/5/.\n");
        assert_eq!(fx.transport.sent()[0].method(), HttpMethod::Delete);
    }

    async fn login(fx: &Fixture) {
        let (result, _) = run(
            fx,
            Command::Login {
                username: "testuser".into(),
                password: Some("secret1".into()),
                remember: false,
            },
        )
        .await;
        assert!(result.is_ok());
    }

    fn batch_json(id: u64, status: &str) -> Value {
        json!({
            "batch_id": id,
            "country": "NL",
            "production_type": "organic",
            "production_date": "2024-05-01T00:00:00Z",
            "cluster_group": "north",
            "quantity": 10,
            "uoms": "kg",
            "status": status
        })
    }

    fn bag_json(id: u64, batch: u64, status: &str) -> Value {
        json!({
            "bag_id": id,
            "batch": batch,
            "internal_lot_number": "L-1",
            "state": "sealed",
            "qr_code": "QR-1",
            "external_lot_number": "E-1",
            "external_update_date": "2024-05-02T00:00:00Z",
            "status": status
        })
    }

    /// Batch 3 is completed, batch 4 is working, bag 9 belongs to batch 3.
    fn tracker_backend() -> MockTransport {
        MockTransport::new(|request| match (request.method(), request.path()) {
            (HttpMethod::Get, "/batches/3/") => respond(200, batch_json(3, "completed")),
            (HttpMethod::Get, "/batches/4/") => respond(200, batch_json(4, "working")),
            (HttpMethod::Get, "/bags/9/") => respond(200, bag_json(9, 3, "working")),
            (HttpMethod::Patch, "/batches/3/") => respond(200, batch_json(3, "working")),
            (HttpMethod::Patch, "/batches/4/") => respond(200, batch_json(4, "completed")),
            _ => respond(404, json!({"detail": "Not found."})),
        })
    }

    fn patches(fx: &Fixture) -> usize {
        fx.transport
            .sent()
            .iter()
            .filter(|request| request.method() == HttpMethod::Patch)
            .count()
    }

    #[tokio::test]
    async fn test_completed_batch_is_locked_for_regular_user() {
        let fx = fixture(tracker_backend());
        login(&fx).await;

        let (result, out) = run(
            &fx,
            Command::Batches {
                action: RecordCommand::SetStatus {
                    id: 3,
                    status: RecordStatus::Working,
                },
            },
        )
        .await;

        let error = result.unwrap_err();
        assert!(matches!(error, CommandError::Locked { .. }));
        assert!(error.render().contains("/batches/3/ is completed"));
        assert!(out.is_empty());
        assert_eq!(patches(&fx), 0);
    }

    #[tokio::test]
    async fn test_completed_batch_patch_is_locked_for_regular_user() {
        let fx = fixture(tracker_backend());
        login(&fx).await;

        let (result, _) = run(
            &fx,
            Command::Batches {
                action: RecordCommand::Item(ItemCommand::Patch {
                    id: 3,
                    json: r#"{"quantity": 5}"#.into(),
                }),
            },
        )
        .await;

        assert!(matches!(result, Err(CommandError::Locked { .. })));
        assert_eq!(patches(&fx), 0);
    }

    #[tokio::test]
    async fn test_staff_may_reopen_completed_batch() {
        let fx = fixture(tracker_backend());
        login(&fx).await;
        let staff: UserProfile =
            serde_json::from_value(json!({"id": 2, "username": "admin", "is_staff": true}))
                .unwrap();
        fx.runner.api.client().session().set_profile(staff).await.unwrap();

        let (result, out) = run(
            &fx,
            Command::Batches {
                action: RecordCommand::SetStatus {
                    id: 3,
                    status: RecordStatus::Working,
                },
            },
        )
        .await;

        assert!(result.is_ok());
        assert!(out.contains("\"status\": \"working\""));
        let sent = fx.transport.sent();
        let patch = sent.iter().find(|r| r.method() == HttpMethod::Patch).unwrap();
        assert_eq!(patch.body(), Some(&json!({"status": "working"})));
    }

    #[tokio::test]
    async fn test_open_batch_status_change_is_sent() {
        let fx = fixture(tracker_backend());
        login(&fx).await;

        let (result, _) = run(
            &fx,
            Command::Batches {
                action: RecordCommand::SetStatus {
                    id: 4,
                    status: RecordStatus::Completed,
                },
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(patches(&fx), 1);
    }

    #[tokio::test]
    async fn test_bag_of_completed_batch_is_locked() {
        let fx = fixture(tracker_backend());
        login(&fx).await;

        let (result, _) = run(
            &fx,
            Command::Bags {
                action: RecordCommand::SetStatus {
                    id: 9,
                    status: RecordStatus::Completed,
                },
            },
        )
        .await;

        let error = result.unwrap_err();
        assert!(error.render().contains("batch 3 is completed"));
        assert_eq!(fx.transport.sent_to("/batches/3/"), 1);
        assert_eq!(patches(&fx), 0);
    }

    #[test]
    fn test_render_session_ended() {
        let error = CommandError::Api(ApiError::SessionEnded { status: Some(403) });
        assert!(error.render().contains("log in again"));
    }

    #[test]
    fn test_render_transient_failure() {
        let error = CommandError::Api(ApiError::RefreshFailed {
            status: None,
            message: "connection refused".into(),
        });
        assert!(error.render().contains("try again"));
    }

    #[test]
    fn test_render_backend_field_errors() {
        let error = CommandError::Api(ApiError::http(
            400,
            json!({"quantity": ["Quantity must be positive"], "uoms": ["This field is required."]}),
        ));

        let rendered = error.render();
        assert!(rendered.contains("  quantity: Quantity must be positive"));
        assert!(rendered.contains("  uoms: This field is required."));
    }

    #[test]
    fn test_render_detail() {
        let error = CommandError::Api(ApiError::http(404, json!({"detail": "Not found."})));
        assert_eq!(error.render(), "request failed with HTTP 404: Not found.");
    }

    #[test]
    fn test_read_json_arg_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{"status": "working"}"#).unwrap();

        let value = read_json_arg(&format!("@{}", path.display())).unwrap();

        assert_eq!(value, json!({"status": "working"}));
    }
}
