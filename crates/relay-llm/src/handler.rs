//! Axum route handler for the messages endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use relay_core::{HttpError, error_body};

use crate::error::LlmError;
use crate::protocol::frontend::FrontendRequest;
use crate::state::{EventStream, LlmState};

/// Build the router with the messages endpoint
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/messages", routing::post(messages))
        .with_state(state)
}

/// Handle `POST /v1/messages`
async fn messages(State(state): State<LlmState>, body: Bytes) -> Response {
    tracing::debug!(body = %String::from_utf8_lossy(&body), "frontend request");

    let request: FrontendRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse request body");
            return error_response(&LlmError::MalformedBody(e.to_string()));
        }
    };

    tracing::info!(model = %request.model, stream = request.stream, messages = request.messages.len(), "messages request");

    if request.stream {
        match state.complete_stream(request).await {
            Ok(events) => sse_response(events),
            Err(e) => error_response(&e),
        }
    } else {
        match state.complete(request).await {
            Ok(response) => Json(response).into_response(),
            Err(e) => error_response(&e),
        }
    }
}

/// Render payloads as `event: <name>` / `data: <json>` frames
fn sse_response(events: EventStream) -> Response {
    let frames = events.map(|event| Event::default().event(event.name()).json_data(&event));

    let sse = Sse::new(frames).keep_alive(KeepAlive::default());

    ([(CONNECTION, "keep-alive"), (ACCESS_CONTROL_ALLOW_ORIGIN, "*")], sse).into_response()
}

/// Convert an error to a frontend-style JSON error response
fn error_response(error: &LlmError) -> Response {
    if error.status_code().is_server_error() {
        tracing::error!(error = %error, "request failed");
    }

    (error.status_code(), Json(error_body(error))).into_response()
}
