//! Twilio REST client for placing outbound calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Timeout for telephony REST requests.
const TELEPHONY_TIMEOUT: Duration = Duration::from_secs(10);

fn default_api_base() -> String {
    "https://api.twilio.com".to_string()
}

/// Twilio account settings. Empty strings mean "not configured".
#[derive(Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default, skip_serializing)]
    pub auth_token: String,
    /// Number outbound calls are placed from.
    #[serde(default)]
    pub phone_number: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            phone_number: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl fmt::Debug for TelephonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelephonyConfig {
    /// Whether account credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("telephony not configured: {0}")]
    NotConfigured(String),

    #[error("telephony provider error: {0}")]
    Upstream(String),

    #[error("unexpected telephony response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::Upstream(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CreatedCall {
    sid: Option<String>,
}

/// Client for the telephony provider's call API.
#[derive(Debug, Clone)]
pub struct TelephonyClient {
    config: TelephonyConfig,
    public_url: String,
    http: reqwest::Client,
}

impl TelephonyClient {
    pub fn new(config: TelephonyConfig, public_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TELEPHONY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            config,
            public_url: public_url.into(),
            http,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }

    /// Fails unless credentials, a sending number and a public URL are set.
    pub fn ensure_ready(&self) -> Result<(), TelephonyError> {
        if !self.config.has_credentials() {
            return Err(TelephonyError::NotConfigured(
                "account SID and auth token are required".to_string(),
            ));
        }
        if self.public_url.is_empty() {
            return Err(TelephonyError::NotConfigured(
                "public server URL is not set".to_string(),
            ));
        }
        if self.config.phone_number.is_empty() {
            return Err(TelephonyError::NotConfigured(
                "sending phone number is not set".to_string(),
            ));
        }
        Ok(())
    }

    fn webhook_url(&self, path: &str) -> Result<String, TelephonyError> {
        Url::parse(&self.public_url)
            .and_then(|base| base.join(path))
            .map(|url| url.to_string())
            .map_err(|e| TelephonyError::NotConfigured(format!("invalid public URL: {}", e)))
    }

    /// Places a call to `to`, returning the provider's call identifier.
    ///
    /// The provider fetches `/voice_webhook` once the call connects and
    /// reports status changes to `/call_status`.
    pub async fn create_call(&self, to: &str) -> Result<String, TelephonyError> {
        self.ensure_ready()?;

        let webhook = self.webhook_url("/voice_webhook")?;
        let status_callback = self.webhook_url("/call_status")?;
        let endpoint = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        );

        let response = self
            .http
            .post(endpoint)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Url", webhook.as_str()),
                ("Method", "POST"),
                ("StatusCallback", status_callback.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "telephony API error");
            return Err(TelephonyError::Upstream(format!(
                "call creation returned {}: {}",
                status, body
            )));
        }

        let created: CreatedCall = response
            .json()
            .await
            .map_err(|e| TelephonyError::InvalidResponse(e.to_string()))?;
        created
            .sid
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| TelephonyError::InvalidResponse("response has no call sid".to_string()))
    }
}
