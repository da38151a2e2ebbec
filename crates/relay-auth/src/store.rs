use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use relay_config::AuthConfig;
use secrecy::ExposeSecret;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use url::Url;

use crate::token::{RefreshRequest, TokenFile};
use crate::{AuthError, Token, TokenSource};

/// File-backed token source with refresh support
pub struct TokenStore {
    http: reqwest::Client,
    token_path: PathBuf,
    legacy_token_path: Option<PathBuf>,
    refresh_url: Url,
    // Serializes refreshes so concurrent 403s do not race on the file
    refresh_lock: Mutex<()>,
}

impl TokenStore {
    /// Create a store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            token_path: config.token_path.clone(),
            legacy_token_path: config.legacy_token_path.clone(),
            refresh_url: config.refresh_url.clone(),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Path the next read will use
    ///
    /// The primary path wins when it exists; otherwise the legacy path is
    /// used if it exists. When neither exists the primary path is returned
    /// so error messages point at the location a refresh would write to.
    pub async fn resolve_path(&self) -> &Path {
        if tokio::fs::try_exists(&self.token_path).await.unwrap_or(false) {
            return &self.token_path;
        }

        if let Some(legacy) = &self.legacy_token_path
            && tokio::fs::try_exists(legacy).await.unwrap_or(false)
        {
            tracing::debug!(path = %legacy.display(), "using legacy token file");
            return legacy;
        }

        &self.token_path
    }

    async fn read(&self) -> Result<Token, AuthError> {
        let path = self.resolve_path().await;

        let raw = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuthError::NotFound {
                    path: self.token_path.clone(),
                }
            } else {
                AuthError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let file: TokenFile = serde_json::from_slice(&raw)?;
        Ok(file.into())
    }

    async fn save(&self, token: &Token) -> Result<(), AuthError> {
        let path = &self.token_path;
        let write_error = |source| AuthError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let contents = serde_json::to_vec_pretty(&TokenFile::from(token))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await.map_err(write_error)?;
        file.write_all(&contents).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;

        // `mode` only applies on creation; tighten an existing file too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(write_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl TokenSource for TokenStore {
    async fn token(&self) -> Result<Token, AuthError> {
        self.read().await
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.read().await?;
        let body = RefreshRequest {
            refresh_token: current.refresh_token.expose_secret(),
        };

        let response = self.http.post(self.refresh_url.clone()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "token refresh rejected");
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                message,
            });
        }

        let raw = response.bytes().await?;
        let file: TokenFile = serde_json::from_slice(&raw)?;
        let token = Token::from(file);

        self.save(&token).await?;
        tracing::info!(path = %self.token_path.display(), "access token refreshed");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::{Json, Router, routing};

    use super::*;

    fn config(dir: &Path, refresh_url: &str) -> AuthConfig {
        AuthConfig {
            token_path: dir.join("primary").join("token.json"),
            legacy_token_path: Some(dir.join("legacy.json")),
            refresh_url: refresh_url.parse().unwrap(),
        }
    }

    fn write_token(path: &Path, access: &str, refresh: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let body = serde_json::json!({ "accessToken": access, "refreshToken": refresh });
        std::fs::write(path, body.to_string()).unwrap();
    }

    async fn spawn_refresh_server(status: StatusCode, calls: Arc<AtomicU32>) -> String {
        let app = Router::new().route(
            "/refreshToken",
            routing::post(move |Json(body): Json<serde_json::Value>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if status != StatusCode::OK {
                        return (status, "denied").into_response();
                    }
                    let refresh = body["refreshToken"].as_str().unwrap_or_default().to_owned();
                    Json(serde_json::json!({
                        "accessToken": format!("new-access-for-{refresh}"),
                        "refreshToken": "new-refresh",
                        "expiresAt": "2030-01-01T00:00:00Z",
                    }))
                    .into_response()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        format!("http://{addr}/refreshToken")
    }

    #[tokio::test]
    async fn reads_primary_token() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "http://127.0.0.1:1/refresh");
        write_token(&config.token_path, "primary-access", "primary-refresh");
        write_token(dir.path().join("legacy.json").as_path(), "legacy-access", "legacy-refresh");

        let store = TokenStore::new(&config).unwrap();
        let token = store.token().await.unwrap();

        assert_eq!(token.access_token.expose_secret(), "primary-access");
        assert!(token.expires_at.is_none());
    }

    #[tokio::test]
    async fn falls_back_to_legacy_token() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "http://127.0.0.1:1/refresh");
        write_token(dir.path().join("legacy.json").as_path(), "legacy-access", "legacy-refresh");

        let store = TokenStore::new(&config).unwrap();
        let token = store.token().await.unwrap();

        assert_eq!(token.access_token.expose_secret(), "legacy-access");
    }

    #[tokio::test]
    async fn missing_token_reports_primary_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "http://127.0.0.1:1/refresh");

        let store = TokenStore::new(&config).unwrap();
        let err = store.token().await.unwrap_err();

        assert!(matches!(err, AuthError::NotFound { ref path } if *path == config.token_path));
    }

    #[tokio::test]
    async fn malformed_token_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "http://127.0.0.1:1/refresh");
        std::fs::create_dir_all(config.token_path.parent().unwrap()).unwrap();
        std::fs::write(&config.token_path, "not json").unwrap();

        let store = TokenStore::new(&config).unwrap();
        assert!(matches!(store.token().await, Err(AuthError::Parse(_))));
    }

    #[tokio::test]
    async fn refresh_persists_new_token_to_primary_path() {
        let calls = Arc::new(AtomicU32::new(0));
        let url = spawn_refresh_server(StatusCode::OK, Arc::clone(&calls)).await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &url);
        write_token(dir.path().join("legacy.json").as_path(), "old-access", "old-refresh");

        let store = TokenStore::new(&config).unwrap();
        let token = store.refresh().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(token.access_token.expose_secret(), "new-access-for-old-refresh");
        assert_eq!(token.expires_at.as_deref(), Some("2030-01-01T00:00:00Z"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&config.token_path).unwrap()).unwrap();
        assert_eq!(written["accessToken"], "new-access-for-old-refresh");
        assert_eq!(written["refreshToken"], "new-refresh");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&config.token_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        // Subsequent reads prefer the freshly written primary file
        let reread = store.token().await.unwrap();
        assert_eq!(reread.refresh_token.expose_secret(), "new-refresh");
    }

    #[tokio::test]
    async fn rejected_refresh_leaves_file_untouched() {
        let calls = Arc::new(AtomicU32::new(0));
        let url = spawn_refresh_server(StatusCode::UNAUTHORIZED, Arc::clone(&calls)).await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &url);
        write_token(&config.token_path, "old-access", "old-refresh");

        let store = TokenStore::new(&config).unwrap();
        let err = store.refresh().await.unwrap_err();

        assert!(matches!(err, AuthError::RefreshRejected { status: 401, .. }));
        let token = store.token().await.unwrap();
        assert_eq!(token.access_token.expose_secret(), "old-access");
    }
}
