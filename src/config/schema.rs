//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Where callers are sent when anything goes wrong.
    pub fallback: FallbackConfig,

    /// Cache lifetime advertised on successful responses.
    pub cache: CacheConfig,

    /// Response body rewriting.
    pub rewrite: RewriteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host (and optional port) substituted into every outbound URL.
    pub target_host: String,

    /// URL scheme used to reach the upstream ("https" or "http").
    pub scheme: String,

    /// Value of the `Node` diagnostic header sent upstream.
    pub node_name: String,

    /// User-Agent used when the caller did not send one.
    pub default_user_agent: String,

    /// Total time allowed for one upstream call, body included.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target_host: "sgejd-hdbidb-datanodeserver.dahi.edu.eu.org".to_string(),
            scheme: "https".to_string(),
            node_name: "UPDATE".to_string(),
            default_user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            max_redirects: 10,
        }
    }
}

/// Fallback redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Absolute URL placed in the `Location` header of the fallback 302.
    pub url: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            url: "https://www.baidu.com/".to_string(),
        }
    }
}

/// Cache policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `max-age` in seconds for `Cache-Control`, `CDN-Cache-Control`
    /// and the preflight `Access-Control-Max-Age`.
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 360_000, // 100 hours
        }
    }
}

/// Body rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Substrings of `Content-Type` that mark a body as text.
    pub textual_types: Vec<String>,

    /// Ordered substitution rules.
    pub rules: Vec<RuleConfig>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            textual_types: ["text", "javascript", "json", "xml", "ecmascript"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            rules: default_rules(),
        }
    }
}

/// A single substitution rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuleConfig {
    /// Regular expression matched against the whole body.
    pub pattern: String,

    /// Literal replacement text.
    pub replacement: String,
}

impl RuleConfig {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(r"@connect\s+greasyfork\.org", "@connect greasyfork.org.cn"),
        RuleConfig::new(
            r"@connect\s+update\.greasyfork\.org",
            "@connect update.greasyfork.org.cn",
        ),
        RuleConfig::new(
            r"@connect\s+api\.greasyfork\.org",
            "@connect api.greasyfork.org.cn",
        ),
        RuleConfig::new(r"greasyfork\.org/", "greasyfork.org.cn/"),
    ]
}

/// Timeout configuration for the server side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
