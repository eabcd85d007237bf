//! Conversation records kept per phone call.
//!
//! A `Conversation` is keyed externally by the telephony provider's call
//! identifier. Its history is append-only and strictly chronological.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller.
    User,
    /// The language model.
    Assistant,
}

/// One entry of conversation history.
///
/// Serializes as `{"role": "user", "content": "..."}`, the shape chat
/// completion APIs accept directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where a call currently sits in the turn-taking protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    /// Call has started; the greeting is being prepared.
    #[default]
    Greeting,
    /// The provider is gathering the caller's speech.
    AwaitingSpeech,
    /// A recognized utterance is being answered.
    Responding,
    /// The call is over. No further transitions.
    Terminated,
}

impl CallPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// State of a single call's dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Chronological turns, oldest first.
    pub history: Vec<Turn>,
    /// System prompt sent with every completion request.
    pub system_prompt: String,
    /// Text spoken when the call connects.
    pub greeting: String,
    /// Current protocol phase.
    #[serde(default)]
    pub phase: CallPhase,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Last time a turn was appended or the phase changed.
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation with the given prompt and greeting.
    pub fn new(system_prompt: impl Into<String>, greeting: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            history: Vec::new(),
            system_prompt: system_prompt.into(),
            greeting: greeting.into(),
            phase: CallPhase::Greeting,
            created_at: now,
            last_activity: now,
        }
    }

    /// Creates a conversation with the default prompt and greeting.
    pub fn with_defaults() -> Self {
        Self::new(crate::DEFAULT_SYSTEM_PROMPT, crate::DEFAULT_GREETING)
    }

    /// Appends a turn to the history.
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
        self.last_activity = Utc::now();
    }

    /// Moves the conversation to `phase`.
    ///
    /// A terminated conversation stays terminated.
    pub fn transition(&mut self, phase: CallPhase) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = phase;
        self.last_activity = Utc::now();
    }

    /// Returns at most the last `window` history entries, in order.
    pub fn recent_history(&self, window: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_GREETING, DEFAULT_SYSTEM_PROMPT, HISTORY_WINDOW};

    #[test]
    fn turn_serializes_lowercase_role() {
        let json = serde_json::to_value(Turn::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn defaults_are_applied() {
        let conv = Conversation::with_defaults();
        assert!(conv.history.is_empty());
        assert_eq!(conv.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(conv.greeting, DEFAULT_GREETING);
        assert_eq!(conv.phase, CallPhase::Greeting);
    }

    #[test]
    fn recent_history_keeps_last_entries_in_order() {
        let mut conv = Conversation::with_defaults();
        for i in 0..9 {
            conv.push(Turn::user(format!("m{i}")));
        }

        let recent = conv.recent_history(HISTORY_WINDOW);
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6", "m7", "m8"]);
        // Older entries are retained.
        assert_eq!(conv.history.len(), 9);
    }

    #[test]
    fn recent_history_shorter_than_window() {
        let mut conv = Conversation::with_defaults();
        conv.push(Turn::user("only"));
        assert_eq!(conv.recent_history(HISTORY_WINDOW).len(), 1);
    }

    #[test]
    fn terminated_is_final() {
        let mut conv = Conversation::with_defaults();
        conv.transition(CallPhase::Terminated);
        conv.transition(CallPhase::AwaitingSpeech);
        assert_eq!(conv.phase, CallPhase::Terminated);
    }
}
