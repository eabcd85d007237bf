#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{Form, Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use callbridge_server::{config::Config, AppState};
use callbridge_voice::{CompletionConfig, SynthesisConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const PUBLIC_URL: &str = "https://calls.example.com";
pub const MOCK_CALL_SID: &str = "CA_mock_0001";

/// Behaviour of the fake providers.
#[derive(Clone)]
pub struct MockBehaviour {
    pub reply: String,
    pub llm_status: StatusCode,
    pub audio: Vec<u8>,
    pub tts_status: StatusCode,
    pub twilio_status: StatusCode,
}

impl Default for MockBehaviour {
    fn default() -> Self {
        Self {
            reply: "Sure, happy to help.".to_string(),
            llm_status: StatusCode::OK,
            audio: vec![0u8; 4096],
            tts_status: StatusCode::OK,
            twilio_status: StatusCode::CREATED,
        }
    }
}

#[derive(Clone)]
struct MockState {
    behaviour: MockBehaviour,
    llm_requests: Arc<Mutex<Vec<Value>>>,
    tts_requests: Arc<Mutex<Vec<Value>>>,
    call_requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

/// Handle to a running set of fake providers.
pub struct MockProviders {
    pub base: String,
    pub llm_requests: Arc<Mutex<Vec<Value>>>,
    pub tts_requests: Arc<Mutex<Vec<Value>>>,
    pub call_requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

async fn completion(State(mock): State<MockState>, Json(body): Json<Value>) -> impl IntoResponse {
    mock.llm_requests.lock().unwrap().push(body);
    let status = mock.behaviour.llm_status;
    if status.is_success() {
        (
            status,
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": mock.behaviour.reply}}]
            })),
        )
    } else {
        (status, Json(json!({"error": {"message": "internal error"}})))
    }
}

async fn synthesize(State(mock): State<MockState>, Json(body): Json<Value>) -> impl IntoResponse {
    mock.tts_requests.lock().unwrap().push(body);
    (
        mock.behaviour.tts_status,
        Bytes::from(mock.behaviour.audio.clone()),
    )
}

async fn create_call(
    State(mock): State<MockState>,
    Path(account): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    mock.call_requests.lock().unwrap().push((account, form));
    let status = mock.behaviour.twilio_status;
    if status.is_success() {
        (status, Json(json!({"sid": MOCK_CALL_SID, "status": "queued"})))
    } else {
        (status, Json(json!({"code": 21211, "message": "invalid number"})))
    }
}

pub async fn spawn_mock_providers(behaviour: MockBehaviour) -> MockProviders {
    let state = MockState {
        behaviour,
        llm_requests: Arc::new(Mutex::new(Vec::new())),
        tts_requests: Arc::new(Mutex::new(Vec::new())),
        call_requests: Arc::new(Mutex::new(Vec::new())),
    };
    let handle = MockProviders {
        base: String::new(),
        llm_requests: state.llm_requests.clone(),
        tts_requests: state.tts_requests.clone(),
        call_requests: state.call_requests.clone(),
    };

    let app = Router::new()
        .route("/chat/completions", post(completion))
        .route("/text-to-speech", post(synthesize))
        .route("/2010-04-01/Accounts/{account}/Calls.json", post(create_call))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProviders {
        base: format!("http://{}", addr),
        ..handle
    }
}

/// Configuration with every provider pointed at `mock`.
pub fn mock_config(mock: &MockProviders, audio_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server.public_url = PUBLIC_URL.to_string();
    config.storage.audio_dir = audio_dir.to_string_lossy().into_owned();
    config.completion = CompletionConfig {
        endpoint: format!("{}/chat/completions", mock.base),
        ..CompletionConfig::new("llm-key")
    };
    config.synthesis = SynthesisConfig {
        endpoint: format!("{}/text-to-speech", mock.base),
        ..SynthesisConfig::new("tts-key")
    };
    config.telephony.account_sid = "AC_test".to_string();
    config.telephony.auth_token = "auth".to_string();
    config.telephony.phone_number = "+15550001111".to_string();
    config.telephony.api_base = mock.base.clone();
    config
}

/// Configuration with no provider credentials at all.
pub fn offline_config(audio_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.audio_dir = audio_dir.to_string_lossy().into_owned();
    config
}

pub fn state(config: &Config) -> AppState {
    AppState::from_config(config)
}

pub fn form_body(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

pub async fn post_form(app: &Router, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, HeaderMap, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form_body(fields)))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}
