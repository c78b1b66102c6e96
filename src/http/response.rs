//! Response assembly.
//!
//! # Responsibilities
//! - Copy upstream headers minus the deny-list (`Vary`, framing headers)
//! - Add CORS and cache headers to every successful response
//! - Build the fallback redirect and the preflight answer
//!
//! # Design Decisions
//! - Header values are computed once at startup, never per request
//! - `Content-Length` is dropped because rewriting changes the body length;
//!   the transport recomputes it

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::ProxyConfig;
use crate::error::InitError;
use crate::http::headers::{strip_hop_by_hop, CDN_CACHE_CONTROL};

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS, POST, PUT, DELETE";

/// Body of an outbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Empty,
    /// Rewritten text.
    Text(String),
    /// Upstream bytes, untouched.
    Binary(Bytes),
}

impl ResponseBody {
    pub fn len(&self) -> usize {
        match self {
            ResponseBody::Empty => 0,
            ResponseBody::Text(text) => text.len(),
            ResponseBody::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The single response produced for an inbound request.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl IntoResponse for OutboundResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Text(text) => Body::from(text),
            ResponseBody::Binary(bytes) => Body::from(bytes),
        };
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Precomputed header policy applied to every outbound response.
#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    cache_control: HeaderValue,
    max_age: HeaderValue,
    fallback_location: HeaderValue,
}

impl ResponsePolicy {
    pub fn new(config: &ProxyConfig) -> Result<Self, InitError> {
        let max_age = config.cache.max_age_secs;
        Ok(Self {
            cache_control: HeaderValue::from_str(&format!("public, max-age={max_age}"))?,
            max_age: HeaderValue::from(max_age),
            fallback_location: HeaderValue::from_str(&config.fallback.url)?,
        })
    }

    /// Build the response for a successful upstream answer.
    pub fn assemble(
        &self,
        status: StatusCode,
        mut headers: HeaderMap,
        body: ResponseBody,
    ) -> OutboundResponse {
        strip_hop_by_hop(&mut headers);
        headers.remove(header::VARY);
        headers.remove(header::CONTENT_LENGTH);

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
        headers.insert(CDN_CACHE_CONTROL, self.cache_control.clone());

        OutboundResponse {
            status,
            headers,
            body,
        }
    }

    /// 302 to the fallback URL. Used for every failure.
    pub fn fallback(&self) -> OutboundResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, self.fallback_location.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        OutboundResponse {
            status: StatusCode::FOUND,
            headers,
            body: ResponseBody::Empty,
        }
    }

    /// Answer to a CORS preflight, produced without contacting upstream.
    pub fn preflight(&self) -> OutboundResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        OutboundResponse {
            status: StatusCode::OK,
            headers,
            body: ResponseBody::Empty,
        }
    }
}
