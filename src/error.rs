//! Error types shared by the proxy pipeline.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use thiserror::Error;

/// Anything that stops a request from producing an upstream-derived response.
///
/// Every variant ends in the fallback redirect; the variants only exist so the
/// failure is logged with the right level and detail.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The outbound request could not be built from the inbound one.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    /// Upstream answered with a client or server error.
    #[error("upstream returned {0}")]
    UpstreamStatus(StatusCode),

    /// Connect, DNS, TLS, timeout, redirect-limit or body read failure.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A textual body was not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

impl ProxyError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest(_) => "invalid_request",
            ProxyError::UpstreamStatus(_) => "upstream_status",
            ProxyError::Transport(e) if e.is_timeout() => "timeout",
            ProxyError::Transport(_) => "transport",
            ProxyError::Decode(_) => "decode",
        }
    }
}

/// Errors raised while building the handler at startup.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid rewrite rule: {0}")]
    Rule(#[from] regex::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}
