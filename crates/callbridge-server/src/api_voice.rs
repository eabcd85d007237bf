//! Telephony webhooks: call start, speech results and call status.
//!
//! Every handler answers with TwiML produced by the
//! [`TurnController`](crate::turn::TurnController).

use crate::{api::ApiError, twiml::VoiceResponse, AppState};
use axum::{
    extract::{Extension, Form},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

/// Form fields the provider posts to the webhooks.
#[derive(Debug, Deserialize)]
pub struct CallWebhookForm {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: String,
    #[serde(rename = "CallStatus", default)]
    pub call_status: String,
}

fn require_call_sid(form: &CallWebhookForm) -> Result<&str, ApiError> {
    let sid = form.call_sid.trim();
    if sid.is_empty() {
        return Err(ApiError::BadRequest("CallSid is required".to_string()));
    }
    Ok(sid)
}

/// Handler for `POST /voice_webhook`.
pub async fn voice_webhook_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<CallWebhookForm>,
) -> Result<VoiceResponse, ApiError> {
    let call_sid = require_call_sid(&form)?;
    tracing::info!(call_sid, "call start webhook");

    let outcome = state.turn_controller().on_call_start(call_sid).await;
    tracing::debug!(call_sid, phase = ?outcome.phase, "call start handled");
    Ok(outcome.response)
}

/// Handler for `POST /process_speech`.
pub async fn process_speech_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<CallWebhookForm>,
) -> Result<VoiceResponse, ApiError> {
    let call_sid = require_call_sid(&form)?;

    let outcome = state
        .turn_controller()
        .on_speech(call_sid, &form.speech_result)
        .await;
    tracing::debug!(call_sid, phase = ?outcome.phase, "speech event handled");
    Ok(outcome.response)
}

/// Handler for `POST /call_status`.
///
/// Outbound calls point their status callback here. For inbound calls the
/// number's status callback URL has to be configured with the provider,
/// or finished calls are never marked terminated.
pub async fn call_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<CallWebhookForm>,
) -> Result<StatusCode, ApiError> {
    let call_sid = require_call_sid(&form)?;
    state
        .turn_controller()
        .on_call_status(call_sid, form.call_status.trim());
    Ok(StatusCode::NO_CONTENT)
}
