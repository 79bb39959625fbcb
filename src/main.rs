use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use batchtrack::application::{RestoreSessionUseCase, SessionManager};
use batchtrack::domain::ports::{AuthPort, KeyValueStorePort, Transport};
use batchtrack::infrastructure::config::Command;
use batchtrack::infrastructure::{
    AppConfig, AuthenticatedClient, CliArgs, CredentialBackend, FileKeyValueStore,
    KeyringKeyValueStore, ReqwestTransport, StorageManager, TokenApi, TrackerApi,
};
use batchtrack::presentation::CommandRunner;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn credential_stores(
    config: &AppConfig,
    storage: &StorageManager,
) -> (Arc<dyn KeyValueStorePort>, Arc<dyn KeyValueStorePort>) {
    let persistent: Arc<dyn KeyValueStorePort> = match config.credential_backend {
        CredentialBackend::File => Arc::new(FileKeyValueStore::new(storage.credentials_path())),
        CredentialBackend::Keyring => Arc::new(KeyringKeyValueStore::new()),
    };
    let session = Arc::new(FileKeyValueStore::new(storage.session_credentials_path()));

    (persistent, session)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("Failed to load configuration")?;
    config.merge_with_args(&args);

    init_logging(&config)?;

    info!(version = batchtrack::VERSION, api_url = %config.api_url, "Starting batchtrack");

    let (persistent, session_store) = credential_stores(&config, &storage);
    let session = Arc::new(SessionManager::new(persistent, session_store));

    let transport: Arc<dyn Transport> = Arc::new(
        ReqwestTransport::with_timeout(&config.api_url, config.request_timeout())
            .wrap_err("Failed to create HTTP client")?,
    );
    let auth: Arc<dyn AuthPort> = Arc::new(TokenApi::new(Arc::clone(&transport)));
    let client = Arc::new(AuthenticatedClient::new(transport, Arc::clone(&auth), session));

    if matches!(args.command, Command::Login { .. } | Command::Logout) {
        client
            .session()
            .hydrate()
            .await
            .wrap_err("Failed to read stored credentials")?;
    } else if let Err(e) = RestoreSessionUseCase::new(Arc::clone(&client)).execute().await {
        warn!(error = %e, "Could not restore session");
        if e.is_session_ended() {
            eprintln!("Your session has ended. Please log in again with `batchtrack login`.");
            return Ok(ExitCode::FAILURE);
        }
    }

    let runner = CommandRunner::new(auth, TrackerApi::new(client));
    let mut stdout = std::io::stdout();

    match runner.run(args.command, &mut stdout).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e.render());
            Ok(ExitCode::FAILURE)
        }
    }
}
