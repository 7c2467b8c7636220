use serde::{Deserialize, Serialize};

/// A single cookie bound to the storefront domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// Authenticated session, shared read-only across pursuits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub cookies: Vec<SessionCookie>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, cookies: Vec<SessionCookie>) -> Self {
        Self {
            username: username.into(),
            cookies,
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }
}
