//! Mock chat backend and token refresh endpoint
//!
//! Serves canned event-stream bodies on `/generateAssistantResponse` and
//! issues new token pairs on `/refreshToken`, counting calls to both.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// How the mock answers generation requests
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given event-stream body
    Frames(Bytes),
    /// 403, as for an expired access token
    Forbidden,
    /// 400 carrying the backend's malformed-request marker
    Malformed,
}

/// Request as seen by the mock
#[derive(Debug, Clone)]
pub struct Captured {
    pub body: serde_json::Value,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: Reply,
    generate_count: AtomicU32,
    refresh_count: AtomicU32,
    last_request: Mutex<Option<Captured>>,
}

impl MockBackend {
    /// Start a mock that answers every generation request with `reply`
    pub async fn start(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            generate_count: AtomicU32::new(0),
            refresh_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        });

        let app = Router::new()
            .route("/generateAssistantResponse", routing::post(handle_generate))
            .route("/refreshToken", routing::post(handle_refresh))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for `backend.base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL for `auth.refresh_url`
    pub fn refresh_url(&self) -> String {
        format!("http://{}/refreshToken", self.addr)
    }

    pub fn generate_count(&self) -> u32 {
        self.state.generate_count.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> u32 {
        self.state.refresh_count.load(Ordering::SeqCst)
    }

    /// The most recent generation request
    pub fn last_request(&self) -> Option<Captured> {
        self.state.last_request.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn handle_generate(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
    state.generate_count.fetch_add(1, Ordering::SeqCst);

    let captured = Captured {
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        authorization: header(&headers, "authorization"),
        accept: header(&headers, "accept"),
    };
    *state.last_request.lock().unwrap() = Some(captured);

    match &state.reply {
        Reply::Frames(frames) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/vnd.amazon.eventstream")],
            frames.clone(),
        )
            .into_response(),
        Reply::Forbidden => (StatusCode::FORBIDDEN, "{\"message\":\"token expired\"}").into_response(),
        Reply::Malformed => (
            StatusCode::BAD_REQUEST,
            "{\"message\":\"Improperly formed request.\",\"reason\":null}",
        )
            .into_response(),
    }
}

async fn handle_refresh(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let n = state.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
    let refresh = body["refreshToken"].as_str().unwrap_or_default();

    Json(serde_json::json!({
        "accessToken": format!("refreshed-{n}-from-{refresh}"),
        "refreshToken": "rotated-refresh",
        "expiresAt": "2030-01-01T00:00:00Z",
    }))
}
