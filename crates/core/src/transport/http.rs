//! reqwest-backed storefront transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::RetailerConfig;
use crate::session::SessionContext;

use super::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// HTTP transport carrying the authenticated session cookies.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport whose cookie jar is seeded from `session`.
    pub fn new(config: &RetailerConfig, session: &SessionContext) -> Result<Self, TransportError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let url = Url::parse(&base_url)
            .map_err(|e| TransportError::Internal(format!("invalid base url {}: {}", base_url, e)))?;

        let jar = Jar::default();
        let domain = cookie_domain(&url);
        for cookie in &session.cookies {
            jar.add_cookie_str(
                &format!("{}={}; Domain={}; Path=/", cookie.name, cookie.value, domain),
                &url,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.as_str())
            .cookie_provider(Arc::new(jar))
            .build()
            .map_err(|e| TransportError::Internal(format!("failed to create HTTP client: {}", e)))?;

        debug!(
            "HTTP transport ready for {} with {} session cookies",
            base_url,
            session.cookies.len()
        );

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Cookie domain covering the storefront host and its subdomains.
fn cookie_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    format!(".{}", host.strip_prefix("www.").unwrap_or(host))
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);

        let mut builder = self.client.request(reqwest_method(request.method), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method: request.method,
                    url: url.clone(),
                }
            } else {
                TransportError::ConnectionFailed {
                    method: request.method,
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method: request.method,
                    url: url.clone(),
                }
            } else {
                TransportError::ConnectionFailed {
                    method: request.method,
                    url: url.clone(),
                    message: format!("failed to read response body: {}", e),
                }
            }
        })?;
        debug!("{} {} -> {}", request.method, url, status.as_u16());

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                method: request.method,
                url,
                request_body: request.body_text(),
                response_body: body,
            });
        }

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}
