//! Chat completion client for spoken replies.
//!
//! Requests are kept deliberately small: the last [`HISTORY_WINDOW`] turns,
//! a hard token cap and a low temperature. Callers get either the reply text
//! or a classified [`VoiceError`]; deciding what to say on failure is left to
//! the caller.

use crate::config::CompletionConfig;
use crate::error::VoiceError;
use callbridge_types::{Role, Turn, HISTORY_WINDOW};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for a completion round trip.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(5);

/// Server-side cap on reply length.
pub const MAX_TOKENS: u32 = 30;

/// Sampling temperature.
pub const TEMPERATURE: f32 = 0.3;

/// A message in the chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self::new(role, &turn.content)
    }
}

/// Request body sent to the completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Builds the message list: system prompt, the last [`HISTORY_WINDOW`]
/// history entries, then the new user message.
pub fn build_messages(user_text: &str, history: &[Turn], system_prompt: &str) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(HISTORY_WINDOW + 2);
    messages.push(ChatMessage::new("system", system_prompt));
    messages.extend(history[start..].iter().map(ChatMessage::from));
    messages.push(ChatMessage::new("user", user_text));
    messages
}

/// Client for an OpenRouter-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    config: CompletionConfig,
    http: reqwest::Client,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Builds the request body for `user_text`.
    pub fn request(&self, user_text: &str, history: &[Turn], system_prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: build_messages(user_text, history, system_prompt),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        }
    }

    /// Asks the model for a reply to `user_text`.
    ///
    /// `history` is the conversation so far, excluding `user_text` itself.
    pub async fn complete(
        &self,
        user_text: &str,
        history: &[Turn],
        system_prompt: &str,
    ) -> Result<String, VoiceError> {
        if !self.is_configured() {
            return Err(VoiceError::NotConfigured(
                "completion API key is not set".to_string(),
            ));
        }

        let preview: String = user_text.chars().take(50).collect();
        tracing::info!(input = %preview, "requesting completion");

        let body = self.request(user_text, history, system_prompt);
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %text, "completion API error");
            return Err(VoiceError::UpstreamStatus {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            VoiceError::InvalidUpstreamPayload(format!("malformed completion response: {}", e))
        })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                VoiceError::InvalidUpstreamPayload("completion response has no content".to_string())
            })?;

        let preview: String = reply.chars().take(50).collect();
        tracing::info!(reply = %preview, "completion received");
        Ok(reply)
    }
}
