//! Single-attempt upstream dispatch.
//!
//! # Responsibilities
//! - Issue the translated request with the shared reqwest client
//! - Follow redirects so the caller only ever sees the final answer
//! - Turn `status >= 400` into an error before the body is read
//! - Buffer the success body
//!
//! # Design Decisions
//! - No retries: one inbound request, at most one upstream attempt
//! - Every failure surfaces as `ProxyError`; the handler decides what the
//!   caller sees

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

/// Request as it will be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A successful (`status < 400`) upstream answer with its body buffered.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// URL of the last hop after redirects.
    pub final_url: String,
}

impl UpstreamResponse {
    /// Declared media type, or the empty string when absent or unreadable.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Sends requests to the configured upstream.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
}

impl Dispatcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    pub async fn dispatch(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(ProxyError::UpstreamStatus(status));
        }

        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(
            status = %status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(UpstreamResponse {
            status,
            headers,
            body,
            final_url,
        })
    }
}
