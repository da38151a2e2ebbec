//! Shared request state and the per-request translation pipeline

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use http::StatusCode;
use relay_auth::TokenSource;
use relay_config::{Config, TranslationConfig};
use relay_core::HttpError;
use secrecy::ExposeSecret;

use crate::backend::{Backend, BackendResponse, HttpBackend};
use crate::convert::{self, response};
use crate::error::LlmError;
use crate::protocol::frontend::{FrontendRequest, MessageResponse, StreamEvent};
use crate::stream::{self, Pacer};

/// Boxed SSE payload stream
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Shared state for the messages handler
#[derive(Clone)]
pub struct LlmState {
    pub(crate) inner: Arc<LlmStateInner>,
}

pub(crate) struct LlmStateInner {
    pub(crate) translation: TranslationConfig,
    pub(crate) profile_arn: String,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) tokens: Arc<dyn TokenSource>,
    pub(crate) pacer: Arc<dyn Pacer>,
}

impl LlmState {
    /// Assemble state from explicit collaborators
    pub fn new(
        translation: TranslationConfig,
        profile_arn: String,
        backend: Arc<dyn Backend>,
        tokens: Arc<dyn TokenSource>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            inner: Arc::new(LlmStateInner {
                translation,
                profile_arn,
                backend,
                tokens,
                pacer,
            }),
        }
    }

    /// Build state from configuration with the HTTP backend
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be constructed.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenSource>) -> Result<Self, LlmError> {
        let backend = HttpBackend::new(&config.backend)?;

        Ok(Self::new(
            config.translation.clone(),
            config.backend.profile_arn.clone(),
            Arc::new(backend),
            tokens,
            stream::pacer_from_config(&config.streaming),
        ))
    }

    /// Translate, forward and aggregate a non-streaming request
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be read, the backend is
    /// unreachable or rejects the request, or the token was just refreshed.
    pub async fn complete(&self, request: FrontendRequest) -> Result<MessageResponse, LlmError> {
        let backend_response = self.send(&request, false).await?;

        if backend_response.status.is_success() {
            return response::from_backend(&backend_response.body, &request.model);
        }

        Err(self.failure(backend_response).await)
    }

    /// Translate and forward a streaming request
    ///
    /// Only a token read failure is returned as an error; every backend
    /// failure becomes a single `error` event.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token cannot be read.
    pub async fn complete_stream(&self, request: FrontendRequest) -> Result<EventStream, LlmError> {
        let backend_response = match self.send(&request, true).await {
            Ok(response) => response,
            Err(e @ LlmError::Token(_)) => return Err(e),
            Err(e) => return Ok(stream::error_events(e.client_message()).boxed()),
        };

        if !backend_response.status.is_success() {
            let error = self.failure(backend_response).await;
            return Ok(stream::error_events(error.client_message()).boxed());
        }

        if let Err(e) = response::check_rejected(&backend_response.body) {
            tracing::warn!(error = %e, "backend rejected streaming request");
            return Ok(stream::error_events(e.client_message()).boxed());
        }

        let reconstruction = response::decode_body(&backend_response.body);
        let events = stream::message_events(
            reconstruction,
            request.model,
            convert::message_id(),
            Arc::clone(&self.inner.pacer),
        );

        Ok(events.boxed())
    }

    async fn send(&self, request: &FrontendRequest, stream: bool) -> Result<BackendResponse, LlmError> {
        let token = self.inner.tokens.token().await.map_err(|e| {
            tracing::error!(error = %e, "failed to get access token");
            LlmError::Token(e)
        })?;

        let backend_request = convert::to_backend(request, &self.inner.translation, &self.inner.profile_arn);

        self.inner
            .backend
            .generate(&backend_request, token.access_token.expose_secret(), stream)
            .await
    }

    /// Error for a non-success backend response
    ///
    /// A 403 triggers exactly one token refresh before reporting.
    async fn failure(&self, backend_response: BackendResponse) -> LlmError {
        let status = backend_response.status;
        let body = String::from_utf8_lossy(&backend_response.body);
        tracing::error!(status = %status, body = %body, "backend returned error");

        if status == StatusCode::FORBIDDEN {
            if let Err(e) = self.inner.tokens.refresh().await {
                tracing::error!(error = %e, "failed to refresh token");
            }
            return LlmError::BackendAuthExpired;
        }

        if let Err(e) = response::check_rejected(&backend_response.body) {
            return e;
        }

        LlmError::BackendUnavailable(format!("backend returned {status}: {body}"))
    }
}
