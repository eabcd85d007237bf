//! Server configuration loading from file and environment variables.

use crate::telephony::TelephonyConfig;
use callbridge_voice::{CompletionConfig, SynthesisConfig};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Telephony provider account.
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Chat completion provider.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Text-to-speech provider.
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Local storage for synthesized audio.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional cleanup of old conversations and audio files.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Publicly reachable base URL (webhooks and audio links are built from
    /// it). Empty when unset.
    #[serde(default)]
    pub public_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "callbridge_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Audio storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory synthesized audio files are written to and served from.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
}

/// Retention configuration. A TTL of 0 keeps records forever.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Seconds of inactivity after which a conversation is dropped.
    #[serde(default)]
    pub conversation_ttl_seconds: u64,

    /// Age in seconds after which synthesized audio files are deleted.
    #[serde(default)]
    pub audio_ttl_seconds: u64,

    /// Seconds between retention sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audio_dir() -> String {
    "audio_files".to_string()
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            conversation_ttl_seconds: 0,
            audio_ttl_seconds: 0,
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from `lookup` (normally the process environment):
///
/// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`
/// - `OPENROUTER_API_KEY`
/// - `SARVAM_API_KEY`
/// - `SERVER_URL` overrides `server.public_url`
/// - `CALLBRIDGE_HOST`, `CALLBRIDGE_PORT`
/// - `CALLBRIDGE_AUDIO_DIR` overrides `storage.audio_dir`
/// - `CALLBRIDGE_LOG_LEVEL`, `CALLBRIDGE_LOG_JSON` ("true" or "1")
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let set = |target: &mut String, key: &str| {
        if let Some(value) = lookup(key) {
            *target = value.trim().to_string();
        }
    };

    set(&mut config.telephony.account_sid, "TWILIO_ACCOUNT_SID");
    set(&mut config.telephony.auth_token, "TWILIO_AUTH_TOKEN");
    set(&mut config.telephony.phone_number, "TWILIO_PHONE_NUMBER");
    set(&mut config.completion.api_key, "OPENROUTER_API_KEY");
    set(&mut config.synthesis.api_key, "SARVAM_API_KEY");
    set(&mut config.server.public_url, "SERVER_URL");
    set(&mut config.storage.audio_dir, "CALLBRIDGE_AUDIO_DIR");
    set(&mut config.logging.level, "CALLBRIDGE_LOG_LEVEL");

    if let Some(host) = lookup("CALLBRIDGE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("CALLBRIDGE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(json) = lookup("CALLBRIDGE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
