use async_trait::async_trait;
use tracing::info;

use crate::config::AccountConfig;

use super::{SessionContext, SessionCookie, SessionError, SessionProvider};

/// Session provider that imports a cookie bundle from an already signed-in
/// browser session.
///
/// The credential pair must be configured; the cookies belong to that account.
pub struct CookieSessionProvider {
    username: String,
    cookie_header: String,
}

impl CookieSessionProvider {
    pub fn new(username: impl Into<String>, cookie_header: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            cookie_header: cookie_header.into(),
        }
    }

    pub fn from_config(config: &AccountConfig) -> Result<Self, SessionError> {
        let username = non_blank(&config.username);
        let password = non_blank(&config.password);

        match (username, password) {
            (Some(username), Some(_)) => Ok(Self::new(
                username,
                config.cookies.clone().unwrap_or_default(),
            )),
            _ => Err(SessionError::MissingCredentials(
                "account.username and account.password are required".to_string(),
            )),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a `name=value; name2=value2` cookie header.
pub fn parse_cookie_header(header: &str) -> Result<Vec<SessionCookie>, SessionError> {
    header
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| SessionError::InvalidCookie(part.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SessionError::InvalidCookie(part.to_string()));
            }
            Ok(SessionCookie {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl SessionProvider for CookieSessionProvider {
    async fn authenticate(&self) -> Result<SessionContext, SessionError> {
        let cookies = parse_cookie_header(&self.cookie_header)?;
        if cookies.is_empty() {
            return Err(SessionError::NoSessionCookies(self.username.clone()));
        }

        info!("Logged in as {} ({} cookies)", self.username, cookies.len());
        Ok(SessionContext::new(self.username.clone(), cookies))
    }

    fn method_name(&self) -> &'static str {
        "cookie"
    }
}
