#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod backend;
mod duration;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod streaming;
pub mod telemetry;
pub mod translation;

use serde::Deserialize;

pub use auth::*;
pub use backend::*;
pub use health::*;
pub use server::*;
pub use streaming::*;
pub use telemetry::*;
pub use translation::*;

/// Top-level relay configuration
///
/// Every section has defaults, so an empty document is a complete
/// configuration pointing at the public backend endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Inbound HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream chat service configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Token file and refresh endpoint
    #[serde(default)]
    pub auth: AuthConfig,
    /// Request translation constants and model table
    #[serde(default)]
    pub translation: TranslationConfig,
    /// SSE delivery pacing
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
