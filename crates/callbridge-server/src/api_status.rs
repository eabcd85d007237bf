//! Status and dashboard data endpoints.

use crate::AppState;
use axum::extract::{Extension, Json};
use callbridge_types::{CallPhase, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response body for `GET /api/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub twilio_configured: bool,
    pub openrouter_configured: bool,
    pub sarvam_configured: bool,
    pub server_url_configured: bool,
    pub active_conversations: usize,
}

/// One entry of `GET /api/conversations`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub call_sid: String,
    pub phase: CallPhase,
    pub turns: usize,
    pub system_prompt: String,
    pub greeting: String,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Handler for `GET /api/status`.
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        twilio_configured: state.telephony.is_configured(),
        openrouter_configured: state.completion.is_configured(),
        sarvam_configured: state.tts_service.is_configured(),
        server_url_configured: !state.public_url.is_empty(),
        active_conversations: state.conversations.len(),
    })
}

/// Handler for `GET /api/conversations`.
pub async fn list_conversations_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Vec<ConversationSummary>> {
    let summaries = state
        .conversations
        .snapshot()
        .into_iter()
        .map(|(call_sid, conversation)| ConversationSummary {
            call_sid,
            phase: conversation.phase,
            turns: conversation.history.len(),
            system_prompt: conversation.system_prompt,
            greeting: conversation.greeting,
            history: conversation.history,
            created_at: conversation.created_at,
            last_activity: conversation.last_activity,
        })
        .collect();
    Json(summaries)
}
