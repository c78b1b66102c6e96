//! Inbound request model and translation to the upstream request.
//!
//! # Responsibilities
//! - Hold the method, path, query, headers and body of one invocation
//! - Build the upstream URL from the fixed target host
//! - Scrub host-identifying and connection-level headers
//! - Decide whether the body travels upstream
//!
//! # Design Decisions
//! - Path and query are copied as text, never decoded or re-encoded
//! - Only the response is rewritten; the request body is forwarded as is

use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::request::Parts;
use axum::http::Method;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::headers::{strip_hop_by_hop, NODE, X_REQUEST_ID};
use crate::upstream::OutboundRequest;

/// One inbound request, independent of the surface it arrived on.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl InboundRequest {
    /// Build from the parts of a request received by the HTTP server.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body: (!body.is_empty()).then_some(body),
        }
    }

    /// Request ID assigned at the edge, or "-" when there is none.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
    }
}

/// `{scheme}://{target_host}{path}` with `?{query}` appended verbatim.
pub fn upstream_url(upstream: &UpstreamConfig, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}://{}", upstream.scheme, upstream.target_host);
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(path);
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

/// Whether a request with this method may carry a body upstream.
pub fn forwards_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Translate an inbound request into the request sent upstream.
pub fn translate(
    request: InboundRequest,
    upstream: &UpstreamConfig,
) -> Result<OutboundRequest, ProxyError> {
    let url = upstream_url(upstream, &request.path, request.query.as_deref());

    let mut headers = request.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    // Upstream must answer uncompressed so text bodies can be rewritten.
    headers.remove(header::ACCEPT_ENCODING);

    let user_agent = match headers.get(header::USER_AGENT) {
        Some(ua) if !ua.is_empty() => ua.clone(),
        _ => header_value(&upstream.default_user_agent)?,
    };
    headers.insert(header::USER_AGENT, user_agent);
    headers.insert(NODE, header_value(&upstream.node_name)?);

    let body = if forwards_body(&request.method) {
        Some(request.body.unwrap_or_default())
    } else {
        None
    };

    Ok(OutboundRequest {
        method: request.method,
        url,
        headers,
        body,
    })
}

fn header_value(value: &str) -> Result<HeaderValue, ProxyError> {
    HeaderValue::from_str(value)
        .map_err(|e| ProxyError::InvalidRequest(format!("header value {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> UpstreamConfig {
        UpstreamConfig {
            target_host: "origin.example.com".into(),
            ..UpstreamConfig::default()
        }
    }

    fn inbound(method: Method, path: &str, query: Option<&str>) -> InboundRequest {
        InboundRequest {
            method,
            path: path.into(),
            query: query.map(Into::into),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[test]
    fn test_upstream_url_is_verbatim() {
        let config = upstream();
        assert_eq!(
            upstream_url(&config, "/scripts/1-x/code/x.user.js", None),
            "https://origin.example.com/scripts/1-x/code/x.user.js"
        );
        assert_eq!(
            upstream_url(&config, "/a%2Fb", Some("z=1&a=%E4%B8%AD&a=2")),
            "https://origin.example.com/a%2Fb?z=1&a=%E4%B8%AD&a=2"
        );
        assert_eq!(upstream_url(&config, "/", Some("")), "https://origin.example.com/");
        assert_eq!(upstream_url(&config, "", None), "https://origin.example.com/");
    }

    #[test]
    fn test_headers_rewritten() {
        let mut request = inbound(Method::GET, "/", None);
        request.headers.insert(header::HOST, HeaderValue::from_static("edge.example.net"));
        request.headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));
        request.headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        request.headers.insert("node", HeaderValue::from_static("spoofed"));
        request.headers.insert("x-custom", HeaderValue::from_static("kept"));

        let outbound = translate(request, &upstream()).unwrap();

        assert!(outbound.headers.get(header::HOST).is_none());
        assert!(outbound.headers.get(header::ACCEPT_ENCODING).is_none());
        assert!(outbound.headers.get(header::CONNECTION).is_none());
        assert_eq!(outbound.headers["node"], "UPDATE");
        assert_eq!(outbound.headers[header::USER_AGENT], "Mozilla/5.0");
        assert_eq!(outbound.headers["x-custom"], "kept");
    }

    #[test]
    fn test_user_agent_forwarded() {
        let mut request = inbound(Method::GET, "/", None);
        request
            .headers
            .insert(header::USER_AGENT, HeaderValue::from_static("Tampermonkey/5.1"));
        let outbound = translate(request, &upstream()).unwrap();
        assert_eq!(outbound.headers[header::USER_AGENT], "Tampermonkey/5.1");

        let mut request = inbound(Method::GET, "/", None);
        request.headers.insert(header::USER_AGENT, HeaderValue::from_static(""));
        let outbound = translate(request, &upstream()).unwrap();
        assert_eq!(outbound.headers[header::USER_AGENT], "Mozilla/5.0");
    }

    #[test]
    fn test_body_dropped_for_get_and_head() {
        for method in [Method::GET, Method::HEAD] {
            let mut request = inbound(method, "/", None);
            request.body = Some(Bytes::from_static(b"ignored"));
            request
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from_static("7"));
            let outbound = translate(request, &upstream()).unwrap();
            assert!(outbound.body.is_none());
            assert!(outbound.headers.get(header::CONTENT_LENGTH).is_none());
        }
    }

    #[test]
    fn test_body_forwarded_for_other_methods() {
        let mut request = inbound(Method::POST, "/api", None);
        request.body = Some(Bytes::from_static(b"{\"a\":1}"));
        let outbound = translate(request, &upstream()).unwrap();
        assert_eq!(outbound.body.as_deref(), Some(&b"{\"a\":1}"[..]));

        let outbound = translate(inbound(Method::DELETE, "/x", None), &upstream()).unwrap();
        assert_eq!(outbound.body, Some(Bytes::new()));
    }

    #[test]
    fn test_invalid_node_name_rejected() {
        let config = UpstreamConfig {
            node_name: "bad\nvalue".into(),
            ..upstream()
        };
        let err = translate(inbound(Method::GET, "/", None), &config).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest(_)));
    }
}
