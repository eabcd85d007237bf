//! Turn-taking controller for a single phone call.
//!
//! Each webhook from the telephony provider is one event for a call:
//!
//! ```text
//! call start ──► Greeting ──► AwaitingSpeech ──► Responding ──► AwaitingSpeech
//!                                   │                                │
//!                                   └── no speech twice / hangup ────┴──► Terminated
//! ```
//!
//! The controller answers every event with TwiML. Provider failures never
//! escape: a failed synthesis falls back to built-in speech and a failed
//! completion becomes a spoken apology, so the caller always hears
//! something before the turn ends.
//!
//! Events for one call are expected to arrive one at a time. Nothing here
//! serializes concurrent events for the same call.

use crate::store::ConversationStore;
use crate::twiml::{Gather, VoiceResponse};
use callbridge_types::{CallPhase, Turn};
use callbridge_voice::{detect, CompletionClient, TtsService, VoiceError};

/// Voice used for every synthesized reply.
pub const VOICE: &str = "anushka";

const GREETING_PAUSE_SECS: f32 = 0.5;
const REPLY_PAUSE_SECS: f32 = 0.3;

pub const ENGLISH: &str = "en-US";
pub const HINDI: &str = "hi-IN";

pub const GREETING_FALLBACK: &str = "Hello, I am your AI assistant. How can I help you?";
pub const TTS_FAILURE_APOLOGY: &str = "I apologize, there was a technical issue. Please try again.";
pub const UNKNOWN_CALL_MESSAGE: &str = "Sorry, there was an error. Please call again.";
pub const PLEASE_REPEAT: &str = "मुझे आपकी बात समझ नहीं आई। कृपया दोबारा कहें।";
pub const NO_SPEECH_CLOSING: &str = "मुझे कोई आवाज़ नहीं सुनाई दी। धन्यवाद बात करने के लिए। अच्छा दिन हो।";
pub const TIMEOUT_CLOSING: &str = "समय समाप्त हो गया। धन्यवाद बात करने के लिए। अच्छा दिन हो।";

pub const LLM_NOT_CONFIGURED_REPLY: &str = "Error: LLM not configured.";
pub const LLM_BAD_RESPONSE_REPLY: &str = "I encountered an issue generating a response.";
pub const LLM_UNREACHABLE_REPLY: &str = "I had trouble connecting to the AI model.";

/// Provider call statuses after which a call is over.
const TERMINAL_CALL_STATUSES: &[&str] = &["completed", "busy", "failed", "no-answer", "canceled"];

/// Markup for one event plus the phase the call is left in.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: VoiceResponse,
    pub phase: CallPhase,
}

/// Spoken reply used when the completion step fails.
///
/// Only transport failures are reported as a connection problem. A provider
/// that answers with an error status counts as a bad response.
pub fn completion_fallback(err: &VoiceError) -> &'static str {
    match err {
        VoiceError::NotConfigured(_) => LLM_NOT_CONFIGURED_REPLY,
        VoiceError::UpstreamUnavailable(_) => LLM_UNREACHABLE_REPLY,
        VoiceError::UpstreamStatus { .. }
        | VoiceError::InvalidUpstreamPayload(_)
        | VoiceError::Io(_) => LLM_BAD_RESPONSE_REPLY,
    }
}

/// Gathers speech; if nothing is heard, asks once more, then closes the call.
fn gather_window(response: VoiceResponse, closing: &str) -> VoiceResponse {
    final_gather(
        response
            .gather(Gather::default())
            .say(PLEASE_REPEAT, HINDI),
        closing,
    )
}

/// Gathers speech once; if nothing is heard, closes the call.
fn final_gather(response: VoiceResponse, closing: &str) -> VoiceResponse {
    response
        .gather(Gather::default())
        .say(closing, HINDI)
        .hangup()
}

/// Drives the dialogue for calls in a [`ConversationStore`].
#[derive(Debug, Clone, Copy)]
pub struct TurnController<'a> {
    conversations: &'a ConversationStore,
    completion: &'a CompletionClient,
    tts: &'a TtsService,
}

impl<'a> TurnController<'a> {
    pub fn new(
        conversations: &'a ConversationStore,
        completion: &'a CompletionClient,
        tts: &'a TtsService,
    ) -> Self {
        Self {
            conversations,
            completion,
            tts,
        }
    }

    /// Handles the call-start webhook: plays the greeting and starts
    /// gathering speech.
    pub async fn on_call_start(&self, call_sid: &str) -> TurnOutcome {
        let (conversation, created) = self.conversations.get_or_create(call_sid);
        if created {
            tracing::info!(call_sid, "created conversation for inbound call");
        }
        if conversation.phase.is_terminal() {
            tracing::warn!(call_sid, "call start for a terminated call");
            return TurnOutcome {
                response: VoiceResponse::new().say(NO_SPEECH_CLOSING, HINDI).hangup(),
                phase: CallPhase::Terminated,
            };
        }

        let language = detect(&conversation.greeting);
        let response = match self.tts.synthesize(&conversation.greeting, language, VOICE).await {
            Ok(artifact) => {
                tracing::info!(call_sid, url = %artifact.url, "playing synthesized greeting");
                VoiceResponse::new()
                    .pause(GREETING_PAUSE_SECS)
                    .play(artifact.url)
            }
            Err(e) => {
                tracing::warn!(call_sid, error = %e, "greeting synthesis failed, using built-in speech");
                VoiceResponse::new().say(GREETING_FALLBACK, ENGLISH)
            }
        };

        let phase = self
            .conversations
            .transition(call_sid, CallPhase::AwaitingSpeech)
            .unwrap_or(CallPhase::AwaitingSpeech);

        TurnOutcome {
            response: gather_window(response, NO_SPEECH_CLOSING),
            phase,
        }
    }

    /// Handles a speech-result webhook.
    pub async fn on_speech(&self, call_sid: &str, speech_result: &str) -> TurnOutcome {
        let Some(conversation) = self.conversations.get(call_sid) else {
            tracing::error!(call_sid, "no conversation found for speech event");
            return TurnOutcome {
                response: VoiceResponse::new().say(UNKNOWN_CALL_MESSAGE, ENGLISH).hangup(),
                phase: CallPhase::Terminated,
            };
        };

        if conversation.phase.is_terminal() {
            tracing::warn!(call_sid, "speech event for a terminated call");
            return TurnOutcome {
                response: VoiceResponse::new().say(TIMEOUT_CLOSING, HINDI).hangup(),
                phase: CallPhase::Terminated,
            };
        }

        let speech = speech_result.trim();
        if speech.is_empty() {
            tracing::info!(call_sid, "empty speech result, asking caller to repeat");
            let phase = self
                .conversations
                .transition(call_sid, CallPhase::AwaitingSpeech)
                .unwrap_or(CallPhase::AwaitingSpeech);
            return TurnOutcome {
                response: final_gather(
                    VoiceResponse::new().say(PLEASE_REPEAT, HINDI),
                    TIMEOUT_CLOSING,
                ),
                phase,
            };
        }

        tracing::info!(call_sid, speech, "processing speech");
        self.conversations.transition(call_sid, CallPhase::Responding);
        self.conversations.append(call_sid, Turn::user(speech));

        let reply = match self
            .completion
            .complete(speech, &conversation.history, &conversation.system_prompt)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(call_sid, error = %e, "completion failed");
                completion_fallback(&e).to_string()
            }
        };
        self.conversations.append(call_sid, Turn::assistant(reply.as_str()));

        let language = detect(&reply);
        let response = match self.tts.synthesize(&reply, language, VOICE).await {
            Ok(artifact) => {
                tracing::info!(call_sid, url = %artifact.url, "playing synthesized reply");
                VoiceResponse::new()
                    .pause(REPLY_PAUSE_SECS)
                    .play(artifact.url)
            }
            Err(e) => {
                tracing::warn!(call_sid, error = %e, "reply synthesis failed");
                VoiceResponse::new().say(TTS_FAILURE_APOLOGY, ENGLISH)
            }
        };

        let phase = self
            .conversations
            .transition(call_sid, CallPhase::AwaitingSpeech)
            .unwrap_or(CallPhase::Terminated);

        TurnOutcome {
            response: gather_window(response, TIMEOUT_CLOSING),
            phase,
        }
    }

    /// Handles a call-status callback. Terminal statuses end the call.
    ///
    /// This is the only way a call reaches [`CallPhase::Terminated`] after
    /// the provider hangs up: the hangup at the end of a gather window is
    /// not reported back. Outbound calls register the callback themselves.
    /// Inbound calls only report status if the phone number's status
    /// callback is set to `/call_status` in the provider console; otherwise
    /// they stay in `AwaitingSpeech` until retention evicts them.
    ///
    /// Returns the call's phase, or `None` for unknown calls.
    pub fn on_call_status(&self, call_sid: &str, status: &str) -> Option<CallPhase> {
        if TERMINAL_CALL_STATUSES.contains(&status) {
            tracing::info!(call_sid, status, "call ended");
            self.conversations.transition(call_sid, CallPhase::Terminated)
        } else {
            tracing::debug!(call_sid, status, "call status update");
            self.conversations.get(call_sid).map(|c| c.phase)
        }
    }
}
