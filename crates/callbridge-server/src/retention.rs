//! Background tasks for enforcing retention of conversations and audio.
//!
//! Both sweeps are opt-in. With a TTL of 0 nothing is ever removed and
//! conversation records and audio files accumulate for the life of the
//! process.

use crate::store::ConversationStore;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::sleep;

/// Prefix of files written by the synthesizer. Other files are left alone.
const AUDIO_FILE_PREFIX: &str = "tts_";

/// Returns the instant before which a conversation counts as idle.
///
/// `None` when the TTL reaches past the representable time range.
pub fn eviction_cutoff(now: DateTime<Utc>, ttl_seconds: u64) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::try_seconds(i64::try_from(ttl_seconds).ok()?)?;
    now.checked_sub_signed(ttl)
}

/// Starts a background task that periodically drops idle conversations.
///
/// This task runs indefinitely.
///
/// # Arguments
///
/// * `store` - Conversation store to sweep.
/// * `ttl_seconds` - Inactivity after which a conversation is removed.
/// * `interval_seconds` - Time in seconds to wait between sweeps.
pub async fn start_conversation_retention_task(
    store: ConversationStore,
    ttl_seconds: u64,
    interval_seconds: u64,
) {
    if ttl_seconds == 0 {
        tracing::info!("conversation retention disabled (ttl=0)");
        return;
    }
    if eviction_cutoff(Utc::now(), ttl_seconds).is_none() {
        tracing::warn!(
            ttl_seconds,
            "conversation ttl is out of range, retention disabled"
        );
        return;
    }
    let interval = Duration::from_secs(interval_seconds.max(1));
    tracing::info!(
        ttl_seconds,
        interval_seconds,
        "starting conversation retention task"
    );

    loop {
        sleep(interval).await;

        let Some(cutoff) = eviction_cutoff(Utc::now(), ttl_seconds) else {
            tracing::warn!(ttl_seconds, "conversation ttl is out of range, retention stopped");
            return;
        };
        let removed = store.evict_inactive_since(cutoff);
        if removed > 0 {
            tracing::info!(count = removed, remaining = store.len(), "evicted idle conversations");
        } else {
            tracing::debug!("no idle conversations to evict");
        }
    }
}

/// Starts a background task that periodically deletes old audio files.
///
/// This task runs indefinitely.
pub async fn start_audio_retention_task(
    audio_dir: PathBuf,
    ttl_seconds: u64,
    interval_seconds: u64,
) {
    if ttl_seconds == 0 {
        tracing::info!("audio retention disabled (ttl=0)");
        return;
    }
    let interval = Duration::from_secs(interval_seconds.max(1));
    let max_age = Duration::from_secs(ttl_seconds);
    tracing::info!(
        ttl_seconds,
        interval_seconds,
        path = %audio_dir.display(),
        "starting audio retention task"
    );

    loop {
        sleep(interval).await;

        match delete_expired_audio(&audio_dir, max_age).await {
            Ok(count) if count > 0 => tracing::info!(count, "deleted expired audio files"),
            Ok(_) => tracing::debug!("no expired audio files to delete"),
            Err(e) => tracing::error!("audio retention sweep failed: {}", e),
        }
    }
}

/// Deletes synthesized audio files in `dir` at least `max_age` old.
///
/// Returns the number of deleted files. A missing directory counts as empty.
pub async fn delete_expired_audio(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut deleted = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(AUDIO_FILE_PREFIX) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age >= max_age {
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(file = ?name, "failed to delete audio file: {}", e),
            }
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_subtracts_ttl() {
        let now = Utc::now();
        assert_eq!(
            eviction_cutoff(now, 60),
            Some(now - chrono::Duration::seconds(60))
        );
    }

    #[test]
    fn huge_ttl_has_no_cutoff() {
        let now = Utc::now();
        assert_eq!(eviction_cutoff(now, u64::MAX), None);
        assert_eq!(eviction_cutoff(now, i64::MAX as u64), None);
        assert_eq!(eviction_cutoff(now, 9_000_000_000_000), None);
    }

    #[tokio::test]
    async fn out_of_range_ttl_disables_sweep() {
        let store = ConversationStore::new();
        store.insert("CA1", callbridge_types::Conversation::with_defaults());

        // Returns immediately instead of looping or panicking.
        start_conversation_retention_task(store.clone(), u64::MAX, 1).await;

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn deletes_only_synthesized_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tts_1_aaaa.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("tts_2_bbbb.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("keep.wav"), b"x").unwrap();

        let deleted = delete_expired_audio(dir.path(), Duration::ZERO).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(dir.path().join("keep.wav").exists());
        assert!(!dir.path().join("tts_1_aaaa.wav").exists());
    }

    #[tokio::test]
    async fn recent_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tts_1_aaaa.wav"), b"x").unwrap();

        let deleted = delete_expired_audio(dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        assert!(dir.path().join("tts_1_aaaa.wav").exists());
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(
            delete_expired_audio(&missing, Duration::ZERO).await.unwrap(),
            0
        );
    }
}
