use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use url::Url;

const DEFAULT_REFRESH_URL: &str = "https://prod.us-east-1.auth.desktop.kiro.dev/refreshToken";

/// Token file location and refresh endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Primary token file; refreshed tokens are always written here
    #[serde(default = "default_token_path", deserialize_with = "deserialize_path")]
    pub token_path: PathBuf,
    /// Read-only fallback used when the primary file does not exist
    #[serde(default = "default_legacy_token_path", deserialize_with = "deserialize_optional_path")]
    pub legacy_token_path: Option<PathBuf>,
    /// Endpoint that exchanges a refresh token for a new token pair
    #[serde(default = "default_refresh_url")]
    pub refresh_url: Url,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
            legacy_token_path: default_legacy_token_path(),
            refresh_url: default_refresh_url(),
        }
    }
}

/// Expand a leading `~/` to the current user's home directory
///
/// Paths without the prefix, or when no home directory is known, are
/// returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_token_path() -> PathBuf {
    home().join(".config").join("relay").join("token.json")
}

#[allow(clippy::unnecessary_wraps)]
fn default_legacy_token_path() -> Option<PathBuf> {
    Some(home().join(".aws").join("sso").join("cache").join("kiro-auth-token.json"))
}

#[allow(clippy::expect_used)]
fn default_refresh_url() -> Url {
    Url::parse(DEFAULT_REFRESH_URL).expect("valid default URL")
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = PathBuf::deserialize(deserializer)?;
    Ok(expand_home(&raw))
}

fn deserialize_optional_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(expand_home))
}
