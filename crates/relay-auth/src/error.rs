use std::path::PathBuf;

/// Token file and refresh errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither the primary nor the legacy token file exists
    #[error("token file not found at {} or legacy path, log in with the desktop client first", path.display())]
    NotFound {
        /// Primary token path
        path: PathBuf,
    },

    /// Token file exists but could not be read
    #[error("failed to read token file at {}: {source}", path.display())]
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Token file or refresh response is not valid JSON
    #[error("failed to parse token: {0}")]
    Parse(#[from] serde_json::Error),

    /// Refresh request could not be sent
    #[error("failed to send refresh request: {0}")]
    Request(#[from] reqwest::Error),

    /// Refresh endpoint answered with a non-success status
    #[error("refresh token failed with status {status}: {message}")]
    RefreshRejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Refreshed token could not be persisted
    #[error("failed to write token file at {}: {source}", path.display())]
    Write {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
