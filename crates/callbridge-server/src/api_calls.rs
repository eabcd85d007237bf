//! Outbound call placement.

use crate::{api::ApiError, telephony::TelephonyError, AppState};
use axum::extract::{Extension, Json};
use callbridge_types::{Conversation, DEFAULT_GREETING, DEFAULT_SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /api/calls`.
#[derive(Debug, Deserialize)]
pub struct PlaceCallRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub greeting: Option<String>,
}

/// Response body for a placed call.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceCallResponse {
    pub success: bool,
    pub call_sid: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Places an outbound call and registers its conversation.
///
/// The conversation is stored before this returns so the provider's
/// call-start webhook finds it. Blank prompt or greeting fall back to the
/// defaults.
pub async fn place_call(
    state: &AppState,
    phone_number: &str,
    system_prompt: Option<&str>,
    greeting: Option<&str>,
) -> Result<String, TelephonyError> {
    state.telephony.ensure_ready()?;

    let system_prompt = non_empty(system_prompt).unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let greeting = non_empty(greeting).unwrap_or(DEFAULT_GREETING);

    let call_sid = state.telephony.create_call(phone_number).await?;
    state
        .conversations
        .insert(call_sid.as_str(), Conversation::new(system_prompt, greeting));

    tracing::info!(call_sid = %call_sid, to = phone_number, "initiated outbound call");
    Ok(call_sid)
}

/// Handler for `POST /api/calls`.
pub async fn place_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PlaceCallRequest>,
) -> Result<Json<PlaceCallResponse>, ApiError> {
    let phone_number = payload.phone_number.trim();
    if phone_number.is_empty() {
        return Err(ApiError::BadRequest("phone number is required".to_string()));
    }

    let call_sid = place_call(
        &state,
        phone_number,
        payload.system_prompt.as_deref(),
        payload.greeting.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(to = phone_number, error = %e, "failed to initiate call");
        match e {
            TelephonyError::NotConfigured(_) => ApiError::ServiceUnavailable(e.to_string()),
            TelephonyError::Upstream(_) | TelephonyError::InvalidResponse(_) => {
                ApiError::BadGateway(e.to_string())
            }
        }
    })?;

    Ok(Json(PlaceCallResponse {
        success: true,
        call_sid,
    }))
}
