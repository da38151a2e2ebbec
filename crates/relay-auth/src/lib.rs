//! Access token handling for the backend chat service
//!
//! Tokens live in a JSON file written by the desktop client. The gateway
//! only reads that file and, when the backend rejects a token, exchanges
//! the refresh token for a new pair and writes it back.

mod error;
mod store;
mod token;

use async_trait::async_trait;

pub use error::AuthError;
pub use store::TokenStore;
pub use token::Token;

/// Source of backend credentials
///
/// Implementations synchronize their own token cache; callers may invoke
/// both operations concurrently.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current token pair
    async fn token(&self) -> Result<Token, AuthError>;

    /// Exchange the refresh token for a new pair and persist it
    async fn refresh(&self) -> Result<Token, AuthError>;
}
