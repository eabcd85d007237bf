//! Serving of synthesized audio files.
//!
//! The telephony provider fetches every `<Play>` URL from here, so responses
//! are streamed with an exact length and caching disabled.

use crate::{api::ApiError, AppState};
use axum::{
    body::Body,
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use callbridge_voice::LanguageTag;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Read size for streamed audio.
const AUDIO_CHUNK_BYTES: usize = 4096;

/// Determines the content type from a file name.
fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".mp3") {
        "audio/mpeg"
    } else {
        "audio/wav"
    }
}

/// Accepts only plain file names inside the audio directory.
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
}

/// Handler for `GET /audio/{filename}`.
pub async fn serve_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_filename(&filename) {
        tracing::warn!(filename = %filename, "rejected audio file name");
        return Err(ApiError::NotFound("file not found".to_string()));
    }

    let path = state.tts_service.audio_dir().join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(filename = %filename, "audio file not found");
            return Err(ApiError::NotFound("file not found".to_string()));
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "failed to open audio file");
            return Err(ApiError::InternalServerError(
                "error serving file".to_string(),
            ));
        }
    };

    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to stat file: {}", e)))?
        .len();
    tracing::info!(filename = %filename, size, "serving audio file");

    let body = Body::from_stream(ReaderStream::with_capacity(file, AUDIO_CHUNK_BYTES));

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(header::CONTENT_LENGTH, size)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(body)
        .map_err(|e| ApiError::InternalServerError(format!("failed to build response: {}", e)))
}

/// Handler for `GET /test_tts/{text}`.
///
/// Synthesizes `text` in English and reports the resulting URL.
pub async fn test_tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(text): Path<String>,
) -> Response {
    match state
        .tts_service
        .synthesize(&text, LanguageTag::English, crate::turn::VOICE)
        .await
    {
        Ok(artifact) => Json(serde_json::json!({
            "success": true,
            "audio_url": artifact.url,
        }))
        .into_response(),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
        }))
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("a.wav"), "audio/wav");
        assert_eq!(content_type_for("a.ogg"), "audio/wav");
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert!(is_safe_filename("tts_1_abcd.wav"));
        assert!(!is_safe_filename("../secret"));
        assert!(!is_safe_filename("a/b.wav"));
        assert!(!is_safe_filename("a\\b.wav"));
        assert!(!is_safe_filename(""));
    }
}
