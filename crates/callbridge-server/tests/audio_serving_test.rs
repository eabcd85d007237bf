mod common;

use axum::http::StatusCode;
use callbridge_server::app;
use common::{get, offline_config, state};

#[tokio::test]
async fn test_serves_audio_with_streaming_headers() {
    let dir = tempfile::tempdir().unwrap();
    let audio: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(dir.path().join("tts_1700000000_abcd1234.wav"), &audio).unwrap();
    let app = app(state(&offline_config(dir.path())));

    let (status, headers, body) = get(&app, "/audio/tts_1700000000_abcd1234.wav").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "audio/wav");
    assert_eq!(headers["content-length"], "10000");
    assert_eq!(headers["accept-ranges"], "bytes");
    assert_eq!(
        headers["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["expires"], "0");
    assert_eq!(body.as_ref(), audio.as_slice());
}

#[tokio::test]
async fn test_mp3_content_type() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("clip.mp3"), b"ID3fake").unwrap();
    let app = app(state(&offline_config(dir.path())));

    let (status, headers, _) = get(&app, "/audio/clip.mp3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "audio/mpeg");
}

#[tokio::test]
async fn test_missing_audio_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(state(&offline_config(dir.path())));

    let (status, _, _) = get(&app, "/audio/tts_missing.wav").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("audio");
    std::fs::create_dir(&inner).unwrap();
    std::fs::write(dir.path().join("secret.wav"), b"nope").unwrap();
    let app = app(state(&offline_config(&inner)));

    let (status, _, _) = get(&app, "/audio/..%2Fsecret.wav").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tts_debug_endpoint_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(state(&offline_config(dir.path())));

    let (status, _, body) = get(&app, "/test_tts/hello").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("not configured"));
}
