//! Callbridge server binary: the entry point for the telephony assistant.
//!
//! Starts an axum HTTP server with structured logging, optional retention
//! sweeps, and graceful shutdown on SIGTERM/SIGINT.

use callbridge_server::config::{self, Config, LoggingConfig};
use callbridge_server::{app, retention, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CALLBRIDGE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Logs every integration that is missing. None of them stop the server.
fn report_missing_integrations(config: &Config) {
    if !config.telephony.has_credentials() || config.telephony.phone_number.is_empty() {
        tracing::error!("missing Twilio credentials; outbound calls are disabled");
    }
    if !config.completion.is_configured() {
        tracing::error!("missing OpenRouter API key; replies will be canned apologies");
    }
    if !config.synthesis.is_configured() {
        tracing::error!("missing Sarvam AI API key; built-in speech will be used");
    }
    if config.server.public_url.is_empty() {
        tracing::warn!("SERVER_URL not set; webhooks and audio URLs will not work");
    }
}

/// Installs the global subscriber. An unparsable level falls back to `info`.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|e| {
        eprintln!("invalid log level {:?} ({}), using info", logging.level, e);
        EnvFilter::new("info")
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is normal in production.
    let _ = dotenvy::dotenv();

    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );
    report_missing_integrations(&config);

    if let Err(e) = std::fs::create_dir_all(&config.storage.audio_dir) {
        tracing::error!(path = %config.storage.audio_dir, "failed to create audio directory: {}", e);
    }

    let state = AppState::from_config(&config);

    tokio::spawn(retention::start_conversation_retention_task(
        state.conversations.clone(),
        config.retention.conversation_ttl_seconds,
        config.retention.sweep_interval_seconds,
    ));
    tokio::spawn(retention::start_audio_retention_task(
        state.tts_service.audio_dir().to_path_buf(),
        config.retention.audio_ttl_seconds,
        config.retention.sweep_interval_seconds,
    ));

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting callbridge server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("callbridge server shut down");
}

/// Resolves once the process is asked to stop, naming the signal received.
async fn shutdown_signal() {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "shutting down, draining in-flight webhooks");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("cannot listen for SIGTERM: {}", e);
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        name = wait_for_ctrl_c() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
