//! Callbridge server library logic.
//!
//! Hosts the telephony webhooks that drive each call's conversation, the
//! outbound call API, the audio file server and status endpoints.

pub mod api;
pub mod api_audio;
pub mod api_calls;
pub mod api_status;
pub mod api_voice;
pub mod config;
pub mod retention;
pub mod store;
pub mod telephony;
pub mod turn;
pub mod twiml;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use callbridge_voice::{CompletionClient, TtsService};
use config::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use store::ConversationStore;
use telephony::TelephonyClient;
use tower_http::trace::TraceLayer;
use turn::TurnController;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Conversations keyed by call identifier.
    pub conversations: ConversationStore,
    /// Chat completion client.
    pub completion: Arc<CompletionClient>,
    /// TTS service; also owns the audio directory.
    pub tts_service: Arc<TtsService>,
    /// Telephony REST client.
    pub telephony: Arc<TelephonyClient>,
    /// The public URL of the server. Empty when not configured.
    pub public_url: String,
}

impl AppState {
    /// Builds the state and provider clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        let public_url = config.server.public_url.clone();
        Self {
            conversations: ConversationStore::new(),
            completion: Arc::new(CompletionClient::new(config.completion.clone())),
            tts_service: Arc::new(TtsService::new(
                config.synthesis.clone(),
                &config.storage.audio_dir,
                public_url.clone(),
            )),
            telephony: Arc::new(TelephonyClient::new(
                config.telephony.clone(),
                public_url.clone(),
            )),
            public_url,
        }
    }

    /// Controller driving call dialogues against this state.
    pub fn turn_controller(&self) -> TurnController<'_> {
        TurnController::new(&self.conversations, &self.completion, &self.tts_service)
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/voice_webhook", post(api_voice::voice_webhook_handler))
        .route("/process_speech", post(api_voice::process_speech_handler))
        .route("/call_status", post(api_voice::call_status_handler))
        .route("/api/calls", post(api_calls::place_call_handler))
        .route("/api/status", get(api_status::status_handler))
        .route(
            "/api/conversations",
            get(api_status::list_conversations_handler),
        )
        .route("/audio/{filename}", get(api_audio::serve_audio_handler))
        .route("/test_tts/{text}", get(api_audio::test_tts_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
