//! Types for storefront transport operations.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while executing a request.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error(
        "Request {method} {url} failed with status {status}\n\tRequest data: {}\n\tResponse data: {response_body}",
        .request_body.as_deref().unwrap_or("None")
    )]
    Status {
        status: u16,
        method: Method,
        url: String,
        request_body: Option<String>,
        response_body: String,
    },

    #[error("Connection failed: {method} {url}: {message}")]
    ConnectionFailed {
        method: Method,
        url: String,
        message: String,
    },

    #[error("Request timeout: {method} {url}")]
    Timeout { method: Method, url: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP method subset used by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request against the storefront, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path plus query string, starting with `/`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// JSON body. `Some(Value::Null)` sends a literal `null`.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body).map_err(|e| {
            TransportError::Internal(format!(
                "failed to serialize {} {} body: {}",
                self.method, self.path, e
            ))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Serialized body, as recorded in a failed-request fault.
    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().map(|b| b.to_string())
    }

    /// Header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Executes storefront requests.
///
/// Implementations must surface every non-2xx status as
/// [`TransportError::Status`]; callers never inspect error statuses on
/// the `Ok` path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name of this transport (for logging).
    fn name(&self) -> &str;

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
