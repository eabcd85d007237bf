//! TwiML markup for the telephony provider.
//!
//! A [`VoiceResponse`] is an ordered list of verbs the provider executes one
//! after another: pauses, audio playback, built-in speech, speech gathering
//! and hangup.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use std::fmt::Write;

/// Speech recognition locales offered to the provider while gathering.
pub const GATHER_LANGUAGES: &str = "hi-IN,en-US,te-IN";

/// Seconds the provider waits for the caller to start speaking.
pub const GATHER_TIMEOUT_SECS: u32 = 15;

/// Seconds of silence that end an utterance.
pub const SPEECH_TIMEOUT_SECS: u32 = 2;

/// Webhook the provider posts recognized speech to.
pub const SPEECH_ACTION: &str = "/process_speech";

/// Speech-gathering instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Gather {
    pub input: String,
    pub action: String,
    pub method: String,
    pub timeout: u32,
    pub speech_timeout: u32,
    pub finish_on_key: String,
    pub language: String,
    pub enhanced: bool,
    pub speech_model: String,
}

impl Default for Gather {
    fn default() -> Self {
        Self {
            input: "speech".to_string(),
            action: SPEECH_ACTION.to_string(),
            method: "POST".to_string(),
            timeout: GATHER_TIMEOUT_SECS,
            speech_timeout: SPEECH_TIMEOUT_SECS,
            finish_on_key: "#".to_string(),
            language: GATHER_LANGUAGES.to_string(),
            enhanced: true,
            speech_model: "phone_call".to_string(),
        }
    }
}

/// A single TwiML verb.
#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    Pause { length: f32 },
    Play { url: String },
    Say { text: String, language: String },
    Gather(Gather),
    Hangup,
}

/// Ordered TwiML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(mut self, length: f32) -> Self {
        self.verbs.push(Verb::Pause { length });
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play { url: url.into() });
        self
    }

    pub fn say(mut self, text: impl Into<String>, language: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say {
            text: text.into(),
            language: language.into(),
        });
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Whether the document ends the call.
    pub fn hangs_up(&self) -> bool {
        self.verbs.last() == Some(&Verb::Hangup)
    }

    /// Renders the document as TwiML XML.
    pub fn render(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            // Writing to a String cannot fail.
            let _ = match verb {
                Verb::Pause { length } => write!(out, r#"<Pause length="{}"/>"#, length),
                Verb::Play { url } => write!(out, "<Play>{}</Play>", escape(url)),
                Verb::Say { text, language } => write!(
                    out,
                    r#"<Say language="{}">{}</Say>"#,
                    escape(language),
                    escape(text)
                ),
                Verb::Gather(g) => write!(
                    out,
                    r#"<Gather input="{}" action="{}" method="{}" timeout="{}" speechTimeout="{}" finishOnKey="{}" language="{}" enhanced="{}" speechModel="{}"/>"#,
                    escape(&g.input),
                    escape(&g.action),
                    escape(&g.method),
                    g.timeout,
                    g.speech_timeout,
                    escape(&g.finish_on_key),
                    escape(&g.language),
                    g.enhanced,
                    escape(&g.speech_model)
                ),
                Verb::Hangup => write!(out, "<Hangup/>"),
            };
        }
        out.push_str("</Response>");
        out
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.render()).into_response()
    }
}

/// Escapes text for use in XML content and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
