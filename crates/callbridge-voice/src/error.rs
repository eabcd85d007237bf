use thiserror::Error;

/// Failures of the external speech and language providers.
///
/// None of these are fatal to a call: the turn-taking controller maps each
/// one to something spoken to the caller.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// The provider could not be reached or timed out.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider answered with a non-success HTTP status.
    #[error("upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("invalid upstream payload: {0}")]
    InvalidUpstreamPayload(String),

    #[error("audio storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for VoiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VoiceError::UpstreamUnavailable(format!("request timed out: {}", err))
        } else {
            VoiceError::UpstreamUnavailable(err.to_string())
        }
    }
}
