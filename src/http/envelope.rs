//! Serverless function envelope.
//!
//! Platforms that invoke the proxy as a function hand it a JSON event and
//! expect a JSON response whose body is a string. Binary bodies travel as
//! base64 with `isBase64Encoded` set, in both directions.
//!
//! # Design Decisions
//! - Header keys are case-insensitive; a later key overwrites an earlier one
//! - `rawPath`/`rawQueryString` win over `path`/`queryStringParameters`
//! - An event that cannot be read still gets the fallback redirect

use std::collections::BTreeMap;
use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::http::handler::ProxyHandler;
use crate::http::headers::X_REQUEST_ID;
use crate::http::request::InboundRequest;
use crate::http::response::{OutboundResponse, ResponseBody};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid method {0:?}")]
    Method(String),

    #[error("body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Inbound function event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionEvent {
    pub http_method: String,
    pub raw_path: Option<String>,
    pub path: Option<String>,
    pub raw_query_string: Option<String>,
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(deserialize_with = "ordered_headers")]
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

/// Outbound function response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// Headers that carry more than one value, such as `set-cookie`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionEvent {
    /// Convert to the surface-independent request model.
    pub fn into_inbound(self) -> Result<InboundRequest, EnvelopeError> {
        let method = Method::from_bytes(self.http_method.as_bytes())
            .map_err(|_| EnvelopeError::Method(self.http_method.clone()))?;

        let path = self
            .raw_path
            .or(self.path)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());

        let query = match self.raw_query_string.filter(|q| !q.is_empty()) {
            Some(raw) => Some(raw),
            None => self
                .query_string_parameters
                .filter(|params| !params.is_empty())
                .map(|params| {
                    form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(params.iter())
                        .finish()
                }),
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping unrepresentable header"),
            }
        }

        let body = match self.body.filter(|b| !b.is_empty()) {
            Some(body) if self.is_base64_encoded => Some(Bytes::from(STANDARD.decode(body)?)),
            Some(body) => Some(Bytes::from(body)),
            None => None,
        };

        Ok(InboundRequest {
            method,
            path,
            query,
            headers,
            body,
        })
    }
}

impl From<OutboundResponse> for FunctionResponse {
    fn from(response: OutboundResponse) -> Self {
        let mut headers = BTreeMap::new();
        let mut multi_value_headers = BTreeMap::new();
        for name in response.headers.keys() {
            let values: Vec<String> = response
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            if let Some(last) = values.last() {
                headers.insert(name.to_string(), last.clone());
            }
            if values.len() > 1 {
                multi_value_headers.insert(name.to_string(), values);
            }
        }

        let (body, is_base64_encoded) = match response.body {
            ResponseBody::Empty => (String::new(), false),
            ResponseBody::Text(text) => (text, false),
            ResponseBody::Binary(bytes) => (STANDARD.encode(&bytes), true),
        };

        Self {
            status_code: response.status.as_u16(),
            headers,
            multi_value_headers,
            body,
            is_base64_encoded,
        }
    }
}

/// Handle one raw JSON event. Always returns a response.
pub async fn invoke(handler: &ProxyHandler, raw_event: &str) -> FunctionResponse {
    let inbound = serde_json::from_str::<FunctionEvent>(raw_event)
        .map_err(EnvelopeError::from)
        .and_then(FunctionEvent::into_inbound);

    let response = match inbound {
        Ok(mut request) => {
            if !request.headers.contains_key(X_REQUEST_ID) {
                if let Ok(id) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()) {
                    request.headers.insert(X_REQUEST_ID, id);
                }
            }
            handler.handle(request).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Unreadable function event, falling back");
            handler.fallback()
        }
    };

    response.into()
}

/// Deserialize a JSON object into its entries in document order.
fn ordered_headers<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedHeaders;

    impl<'de> Visitor<'de> for OrderedHeaders {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of header names to string values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, value)) = map.next_entry::<String, Option<String>>()? {
                if let Some(value) = value {
                    entries.push((name, value));
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_option(OptionalHeaders(OrderedHeaders))
}

/// Accepts `null` as well as an object for `headers`.
struct OptionalHeaders<V>(V);

impl<'de, V> Visitor<'de> for OptionalHeaders<V>
where
    V: Visitor<'de, Value = Vec<(String, String)>>,
{
    type Value = Vec<(String, String)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.expecting(f)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Vec::new())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self.0)
    }
}
