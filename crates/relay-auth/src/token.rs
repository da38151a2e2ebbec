use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Backend token pair
#[derive(Debug, Clone)]
pub struct Token {
    /// Bearer token for backend requests
    pub access_token: SecretString,
    /// Long-lived token used to obtain a new access token
    pub refresh_token: SecretString,
    /// Expiry timestamp as written by the issuer, if any
    pub expires_at: Option<String>,
}

/// On-disk and refresh-endpoint representation
///
/// Field names follow the desktop client's cache file so both tools can
/// share it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenFile {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

impl From<TokenFile> for Token {
    fn from(file: TokenFile) -> Self {
        Self {
            access_token: SecretString::from(file.access_token),
            refresh_token: SecretString::from(file.refresh_token),
            expires_at: file.expires_at,
        }
    }
}

impl From<&Token> for TokenFile {
    fn from(token: &Token) -> Self {
        Self {
            access_token: token.access_token.expose_secret().to_owned(),
            refresh_token: token.refresh_token.expose_secret().to_owned(),
            expires_at: token.expires_at.clone(),
        }
    }
}
