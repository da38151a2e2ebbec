use std::time::Duration;

use serde::Deserialize;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://codewhisperer.us-east-1.amazonaws.com";
const DEFAULT_PROFILE_ARN: &str = "arn:aws:codewhisperer:us-east-1:699475941385:profile/EHGA3GRVQMUK";

/// Upstream chat service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL; `/generateAssistantResponse` is appended
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Profile identifier sent with every request
    #[serde(default = "default_profile_arn")]
    pub profile_arn: String,
    /// TCP connect timeout
    #[serde(default = "default_connect_timeout", with = "crate::duration")]
    pub connect_timeout: Duration,
    /// Whole-request timeout, including reading the response body
    #[serde(default = "default_request_timeout", with = "crate::duration")]
    pub request_timeout: Duration,
    /// Optional HTTP proxy for outbound calls
    #[serde(default)]
    pub proxy_url: Option<Url>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            profile_arn: default_profile_arn(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            proxy_url: None,
        }
    }
}

impl BackendConfig {
    /// Full URL of the response generation endpoint
    pub fn generate_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/generateAssistantResponse")
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

fn default_profile_arn() -> String {
    DEFAULT_PROFILE_ARN.to_owned()
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}
