//! In-memory conversation store.
//!
//! Maps the telephony provider's call identifier to its [`Conversation`].
//! The map lives for the life of the process unless the retention sweep is
//! enabled. Each running server instance has its own store; state is not
//! shared between processes.

use callbridge_types::{CallPhase, Conversation, Turn};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, lock-guarded map of call id to conversation.
///
/// Uses `std::sync::RwLock`: every critical section is a short map
/// operation and none spans an `.await`.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Conversation>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Conversation>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a conversation, replacing any existing record for the call.
    pub fn insert(&self, call_sid: impl Into<String>, conversation: Conversation) {
        self.write().insert(call_sid.into(), conversation);
    }

    /// Returns a copy of the conversation for `call_sid`.
    pub fn get(&self, call_sid: &str) -> Option<Conversation> {
        self.read().get(call_sid).cloned()
    }

    /// Returns the conversation for `call_sid`, creating one with the
    /// default prompt and greeting if the call is unknown.
    ///
    /// The flag is `true` when a new record was created.
    pub fn get_or_create(&self, call_sid: &str) -> (Conversation, bool) {
        let mut map = self.write();
        let mut created = false;
        let conversation = map.entry(call_sid.to_string()).or_insert_with(|| {
            created = true;
            Conversation::with_defaults()
        });
        (conversation.clone(), created)
    }

    /// Appends `turn` to the call's history. Returns `false` if the call is
    /// unknown.
    pub fn append(&self, call_sid: &str, turn: Turn) -> bool {
        match self.write().get_mut(call_sid) {
            Some(conversation) => {
                conversation.push(turn);
                true
            }
            None => false,
        }
    }

    /// Moves the call to `phase`, returning the phase actually in effect, or
    /// `None` if the call is unknown.
    pub fn transition(&self, call_sid: &str, phase: CallPhase) -> Option<CallPhase> {
        self.write().get_mut(call_sid).map(|conversation| {
            conversation.transition(phase);
            conversation.phase
        })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copies every conversation, ordered by creation time.
    pub fn snapshot(&self) -> Vec<(String, Conversation)> {
        let mut all: Vec<(String, Conversation)> = self
            .read()
            .iter()
            .map(|(sid, conversation)| (sid.clone(), conversation.clone()))
            .collect();
        all.sort_by_key(|(_, conversation)| conversation.created_at);
        all
    }

    /// Removes conversations whose last activity is before `cutoff`.
    ///
    /// Returns the number of removed records.
    pub fn evict_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.write();
        let before = map.len();
        map.retain(|_, conversation| conversation.last_activity >= cutoff);
        before - map.len()
    }
}
