//! Main Entrypoint for the Phone Teacher Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging to the console and to the log sink file.
//! 3. Resolving the completion service credential.
//! 4. Building the completion client, prompt store and dialogue controller.
//! 5. Constructing the Axum router and applying middleware.
//! 6. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use phone_teacher_api::{
    config::Config, log_file::RotatingFile, logs, router::create_router, state::AppState,
};
use phone_teacher_core::{
    dialogue::{DialogueController, DialogueSettings},
    llm_client::{CompletionClient, OpenAICompatibleClient},
    prompt_store::{FilePromptStore, PromptStore},
    voice::VoiceSettings,
};
use secrecy::ExposeSecret;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// Logs to stdout and, without ANSI colors, to the size-bounded log sink file
/// the panel reads.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(config: &Config) -> anyhow::Result<WorkerGuard> {
    let sink = RotatingFile::open(&config.log_path, config.log_max_bytes, config.log_backups)
        .with_context(|| format!("Failed to open log file {}", config.log_path.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(sink);

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(config.log_level))
        .with(tracing_subscriber::fmt::layer().with_timer(ChronoLocal::rfc_3339()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    let _log_guard = init_logging(&config)?;
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Resolve Credential ---
    let api_key = config
        .credential_source
        .resolve()
        .context("Failed to resolve completion service credential")?;

    // --- 4. Initialize Shared Services ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key.expose_secret())
        .with_api_base(config.provider.api_base());
    let completion: Arc<dyn CompletionClient> = Arc::new(
        OpenAICompatibleClient::new(
            openai_config,
            config.chat_model.clone(),
            config.completion_timeout,
        )
        .context("Failed to build completion client")?,
    );

    let prompt_store: Arc<dyn PromptStore> = Arc::new(FilePromptStore::new(&config.prompt_path));
    // Creates the store file on first start so operators can find it.
    prompt_store
        .get()
        .await
        .context("Failed to open prompt store")?;

    let controller = Arc::new(DialogueController::new(
        completion,
        prompt_store.clone(),
        DialogueSettings {
            gather_timeout_secs: config.gather_timeout_secs,
        },
    ));

    let app_state = Arc::new(AppState {
        controller,
        prompt_store,
        voice: Arc::new(VoiceSettings {
            voice: config.voice_name.clone(),
            language: config.voice_language.clone(),
        }),
        log_path: config.log_path.clone(),
        log_poll_interval: logs::DEFAULT_POLL_INTERVAL,
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        log_path = %config.log_path.display(),
        prompt_path = %config.prompt_path.display(),
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
