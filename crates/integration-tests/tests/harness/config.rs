//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use relay_config::{AuthConfig, Config, HealthConfig, ServerConfig, StreamingConfig};

use super::mock_backend::MockBackend;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Configuration pointed at `mock`, with the token file under `token_dir`
    ///
    /// Pacing is disabled so streaming tests finish promptly.
    pub fn new(mock: &MockBackend, token_dir: &Path) -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                health: HealthConfig::default(),
            },
            auth: AuthConfig {
                token_path: token_path(token_dir),
                legacy_token_path: None,
                refresh_url: mock.refresh_url().parse().expect("valid URL"),
            },
            streaming: StreamingConfig {
                pacing: false,
                ..StreamingConfig::default()
            },
            ..Config::default()
        };
        config.backend.base_url = mock.base_url().parse().expect("valid URL");
        config.backend.profile_arn = "arn:test:profile".to_owned();

        Self { config }
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Map a frontend model name to a backend id
    pub fn with_model(mut self, frontend: &str, backend: &str) -> Self {
        self.config
            .translation
            .models
            .insert(frontend.to_owned(), backend.to_owned());
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

/// Location of the token file inside a test directory
pub fn token_path(dir: &Path) -> PathBuf {
    dir.join("token.json")
}

/// Write a token file the gateway will pick up
pub fn write_token(dir: &Path, access: &str, refresh: &str) {
    let body = serde_json::json!({ "accessToken": access, "refreshToken": refresh });
    std::fs::write(token_path(dir), body.to_string()).expect("write token file");
}

/// Read back the access token currently stored on disk
pub fn stored_access_token(dir: &Path) -> String {
    let raw = std::fs::read(token_path(dir)).expect("read token file");
    let value: serde_json::Value = serde_json::from_slice(&raw).expect("token file is JSON");
    value["accessToken"].as_str().unwrap_or_default().to_owned()
}
