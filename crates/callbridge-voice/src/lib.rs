//! Speech and language provider adapters for Callbridge.
//!
//! Wraps the three external services a phone conversation needs besides the
//! telephony provider itself: script-based language detection, chat
//! completion (OpenRouter) for replies, and text-to-speech (Sarvam AI) for
//! turning replies into audio files the telephony provider can play.
//!
//! Every provider call returns a `Result` with a classified [`VoiceError`].
//! Nothing here decides what a caller hears when a provider fails.

pub mod completion;
pub mod config;
pub mod error;
pub mod language;
pub mod tts;

pub use completion::{build_messages, ChatMessage, CompletionClient};
pub use config::{CompletionConfig, SynthesisConfig};
pub use error::VoiceError;
pub use language::{detect, LanguageTag};
pub use tts::{AudioArtifact, AudioPayload, TtsService};
