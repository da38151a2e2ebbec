//! Outbound calls to the backend chat service

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use relay_config::BackendConfig;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::LlmError;
use crate::protocol::backend::BackendRequest;

/// Status and complete body of a backend response
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Sends translated requests to the backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one request and read the whole response body
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn generate(
        &self,
        request: &BackendRequest,
        access_token: &str,
        stream: bool,
    ) -> Result<BackendResponse, LlmError>;
}

/// `reqwest` implementation of [`Backend`]
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    /// Create from backend configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| LlmError::Internal(anyhow::anyhow!("invalid proxy url {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.generate_url(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn generate(
        &self,
        request: &BackendRequest,
        access_token: &str,
        stream: bool,
    ) -> Result<BackendResponse, LlmError> {
        let body = serde_json::to_vec(request).map_err(|e| LlmError::Internal(e.into()))?;
        tracing::debug!(body = %String::from_utf8_lossy(&body), "backend request");

        let mut builder = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if stream {
            builder = builder.header(ACCEPT, "text/event-stream");
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "backend request failed");
            LlmError::BackendUnavailable(e.to_string())
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            tracing::error!(status = %status, error = %e, "failed to read backend response");
            LlmError::BackendUnavailable(format!("failed to read response: {e}"))
        })?;

        tracing::debug!(status = %status, bytes = body.len(), "backend response");

        Ok(BackendResponse { status, body })
    }
}
