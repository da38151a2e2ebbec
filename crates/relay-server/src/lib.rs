mod health;
mod not_found;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use relay_auth::{TokenSource, TokenStore};
use relay_config::Config;
use relay_llm::LlmState;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the token store or backend client cannot be
    /// constructed
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenSource> = Arc::new(TokenStore::new(&config.auth)?);
        Self::with_token_source(config, tokens)
    }

    /// Build the server with a caller-provided token source
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be constructed
    pub fn with_token_source(config: &Config, tokens: Arc<dyn TokenSource>) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();
        let llm_state = LlmState::from_config(config, tokens)?;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app
            .merge(relay_llm::llm_router(llm_state))
            .fallback(not_found::not_found_handler);

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
