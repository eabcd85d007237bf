//! Shared types and constants for the Callbridge telephony assistant.
//!
//! This crate provides the conversation data model used across the
//! workspace: conversation turns, the per-call conversation record, and the
//! call phases the turn-taking controller moves through.
//!
//! Provider adapters (`callbridge-voice`) and the HTTP server
//! (`callbridge-server`) both depend on this crate; it depends on neither.

pub mod conversation;

pub use conversation::{CallPhase, Conversation, Role, Turn};

/// Number of most recent history entries forwarded to the completion step.
///
/// Older entries stay in the conversation record; they are simply not sent.
pub const HISTORY_WINDOW: usize = 6;

/// System prompt used when a call does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Give very short, direct answers (1-2 sentences max). Respond in the same language the user speaks. Be concise and helpful.";

/// Greeting spoken when a call does not supply one.
pub const DEFAULT_GREETING: &str =
    "नमस्ते! मैं आपका AI असिस्टेंट हूँ। मैं आपकी कैसे सहायता कर सकता हूँ?";
