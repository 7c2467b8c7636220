use async_trait::async_trait;
use thiserror::Error;

use super::types::SessionContext;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Credentials not defined: {0}")]
    MissingCredentials(String),

    #[error("No session cookies configured for {0}")]
    NoSessionCookies(String),

    #[error("Invalid session cookie: {0}")]
    InvalidCookie(String),
}

/// Produces the authenticated context shared by every pursuit.
///
/// Called exactly once, before any pursuit starts. Failures are fatal.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn authenticate(&self) -> Result<SessionContext, SessionError>;

    /// Name of this session method
    fn method_name(&self) -> &'static str;
}
