//! Speech synthesis through the Sarvam AI text-to-speech API.
//!
//! A successful synthesis writes one `tts_<unix>_<8 hex>.wav` file into the
//! service's audio directory and returns the URL it is served under, built
//! from the public base URL. Any failure means no file was written and the
//! caller has to fall back to built-in speech.

use crate::config::SynthesisConfig;
use crate::error::VoiceError;
use crate::language::LanguageTag;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Timeout for a synthesis round trip.
pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(8);

/// Maximum number of characters sent to the provider.
pub const MAX_TTS_INPUT_CHARS: usize = 200;

/// Payloads below this size are treated as empty or corrupt.
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Speaker used when a voice name is not recognized.
pub const DEFAULT_SPEAKER: &str = "anushka";

/// Maps a voice preference to a provider speaker name.
///
/// `female` and `male` select the default speakers of that voice; known
/// speaker names pass through; anything else falls back to
/// [`DEFAULT_SPEAKER`].
pub fn speaker_for(voice: &str) -> &'static str {
    match voice {
        "female" | "anushka" => "anushka",
        "male" | "abhilash" => "abhilash",
        "manisha" => "manisha",
        "vidya" => "vidya",
        "arya" => "arya",
        "karun" => "karun",
        "hitesh" => "hitesh",
        _ => DEFAULT_SPEAKER,
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    inputs: Vec<String>,
    target_language_code: &'a str,
    speaker: &'a str,
    model: &'a str,
    audio_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct AudioEnvelope {
    #[serde(default)]
    audios: Vec<String>,
}

/// Audio decoded from a provider response.
///
/// The provider answers either with a JSON envelope carrying base64 audio in
/// an `audios` array, or with the audio bytes directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioPayload {
    Envelope(Vec<u8>),
    Raw(Vec<u8>),
}

impl AudioPayload {
    /// Decodes a response body. The envelope wins when it parses and its
    /// first entry is valid base64; every other body is raw audio.
    pub fn decode(body: &[u8]) -> Self {
        let envelope_audio = serde_json::from_slice::<AudioEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.audios.into_iter().next())
            .and_then(|encoded| {
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .ok()
            });

        match envelope_audio {
            Some(audio) => AudioPayload::Envelope(audio),
            None => AudioPayload::Raw(body.to_vec()),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            AudioPayload::Envelope(b) | AudioPayload::Raw(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            AudioPayload::Envelope(b) | AudioPayload::Raw(b) => b,
        }
    }

    /// Rejects payloads shorter than [`MIN_AUDIO_BYTES`].
    pub fn validate(self) -> Result<Vec<u8>, VoiceError> {
        let len = self.bytes().len();
        if len < MIN_AUDIO_BYTES {
            return Err(VoiceError::InvalidUpstreamPayload(format!(
                "audio payload too small: {} bytes (minimum: {} bytes)",
                len, MIN_AUDIO_BYTES
            )));
        }
        Ok(self.into_bytes())
    }
}

/// A synthesized audio file and the URL it is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
    pub size: usize,
}

/// Client for the Sarvam AI text-to-speech API.
///
/// Each successful synthesis writes a new WAV file into `audio_dir` and
/// returns a public URL under `<public_url>/audio/`.
#[derive(Debug, Clone)]
pub struct TtsService {
    config: SynthesisConfig,
    audio_dir: PathBuf,
    public_url: String,
    http: reqwest::Client,
}

impl TtsService {
    pub fn new(
        config: SynthesisConfig,
        audio_dir: impl AsRef<Path>,
        public_url: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SYNTHESIS_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            config,
            audio_dir: audio_dir.as_ref().to_path_buf(),
            public_url: public_url.into(),
            http,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Directory synthesized files are written to.
    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Synthesizes `text` and stores the audio.
    ///
    /// Any `Err` means "no audio"; the caller decides what to play instead.
    pub async fn synthesize(
        &self,
        text: &str,
        language: LanguageTag,
        voice: &str,
    ) -> Result<AudioArtifact, VoiceError> {
        if !self.is_configured() {
            tracing::error!("TTS API key not configured");
            return Err(VoiceError::NotConfigured(
                "TTS API key is not set".to_string(),
            ));
        }
        if self.public_url.is_empty() {
            tracing::error!("public URL not configured, cannot build audio URL");
            return Err(VoiceError::NotConfigured(
                "public URL is not set".to_string(),
            ));
        }

        let input: String = text.chars().take(MAX_TTS_INPUT_CHARS).collect();
        let preview: String = text.chars().take(50).collect();
        tracing::info!(text = %preview, language = %language, "generating speech");

        let filename = format!(
            "tts_{}_{}.wav",
            chrono::Utc::now().timestamp(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let url = self.audio_url(&filename)?;

        let request = SynthesisRequest {
            inputs: vec![input],
            target_language_code: language.locale(),
            speaker: speaker_for(voice),
            model: &self.config.model,
            audio_format: "wav",
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("api-subscription-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| tracing::error!("TTS request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "TTS API error");
            return Err(VoiceError::UpstreamStatus {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.bytes().await?;
        let payload = AudioPayload::decode(&body);
        if matches!(payload, AudioPayload::Envelope(_)) {
            tracing::debug!("decoded base64 audio envelope");
        }
        let audio = payload.validate().inspect_err(|e| tracing::error!("{}", e))?;

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let path = self.audio_dir.join(&filename);
        tokio::fs::write(&path, &audio).await?;

        tracing::info!(path = %path.display(), size = audio.len(), url = %url, "TTS audio saved");

        Ok(AudioArtifact {
            filename,
            path,
            url,
            size: audio.len(),
        })
    }

    fn audio_url(&self, filename: &str) -> Result<String, VoiceError> {
        let base = Url::parse(&self.public_url)
            .map_err(|e| VoiceError::NotConfigured(format!("public URL is invalid: {}", e)))?;
        let url = base
            .join(&format!("/audio/{}", filename))
            .map_err(|e| VoiceError::NotConfigured(format!("cannot build audio URL: {}", e)))?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn envelope_takes_precedence() {
        let audio = vec![7u8; 1200];
        let body = format!(r#"{{"request_id":"x","audios":["{}"]}}"#, b64(&audio));
        assert_eq!(
            AudioPayload::decode(body.as_bytes()),
            AudioPayload::Envelope(audio)
        );
    }

    #[test]
    fn binary_body_is_raw() {
        let mut wav = b"RIFF".to_vec();
        wav.extend(vec![0u8; 2000]);
        assert_eq!(AudioPayload::decode(&wav), AudioPayload::Raw(wav.clone()));
    }

    #[test]
    fn json_without_audios_is_raw() {
        let body = br#"{"status":"ok"}"#;
        assert_eq!(AudioPayload::decode(body), AudioPayload::Raw(body.to_vec()));

        let empty = br#"{"audios":[]}"#;
        assert_eq!(AudioPayload::decode(empty), AudioPayload::Raw(empty.to_vec()));
    }

    #[test]
    fn invalid_base64_falls_back_to_raw() {
        let body = br#"{"audios":["@@not base64@@"]}"#;
        assert_eq!(AudioPayload::decode(body), AudioPayload::Raw(body.to_vec()));
    }

    #[test]
    fn undersized_payload_boundary() {
        let short = AudioPayload::Raw(vec![0u8; MIN_AUDIO_BYTES - 1]);
        assert!(matches!(
            short.validate(),
            Err(VoiceError::InvalidUpstreamPayload(_))
        ));

        let exact = AudioPayload::Envelope(vec![0u8; MIN_AUDIO_BYTES]);
        assert_eq!(exact.validate().unwrap().len(), 1000);
    }

    #[test]
    fn speaker_mapping() {
        assert_eq!(speaker_for("female"), "anushka");
        assert_eq!(speaker_for("male"), "abhilash");
        assert_eq!(speaker_for("vidya"), "vidya");
        assert_eq!(speaker_for("robot"), DEFAULT_SPEAKER);
    }

    #[test]
    fn audio_url_replaces_base_path() {
        let service = TtsService::new(
            SynthesisConfig::new("k"),
            "audio",
            "https://example.ngrok.app/some/path",
        );
        assert_eq!(
            service.audio_url("tts_1_abcd1234.wav").unwrap(),
            "https://example.ngrok.app/audio/tts_1_abcd1234.wav"
        );
    }

    #[tokio::test]
    async fn missing_public_url_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(SynthesisConfig::new("k"), dir.path(), "");
        let result = service.synthesize("hello", LanguageTag::English, "female").await;
        assert!(matches!(result, Err(VoiceError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let service = TtsService::new(
            SynthesisConfig::default(),
            dir.path(),
            "https://example.com",
        );
        let result = service.synthesize("hello", LanguageTag::English, "female").await;
        assert!(matches!(result, Err(VoiceError::NotConfigured(_))));
    }
}
