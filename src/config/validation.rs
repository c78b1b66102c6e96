//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream host, scheme and fallback URL
//! - Check that every rewrite pattern compiles
//! - Validate value ranges (timeouts > 0, request deadline above the
//!   upstream timeout, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream.target_host must be a bare host[:port], got {0:?}")]
    InvalidTargetHost(String),

    #[error("upstream.scheme must be \"http\" or \"https\", got {0:?}")]
    InvalidScheme(String),

    #[error("fallback.url must be an absolute http(s) URL, got {0:?}")]
    InvalidFallbackUrl(String),

    #[error("rewrite.rules[{index}] pattern does not compile: {reason}")]
    InvalidPattern { index: usize, reason: String },

    #[error("rewrite.textual_types must not be empty")]
    EmptyTextualTypes,

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("timeouts.request_secs ({request}) must exceed upstream.timeout_secs ({upstream})")]
    DeadlineNotAboveUpstream { request: u64, upstream: u64 },

    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = &config.upstream.target_host;
    if !is_bare_host(host) {
        errors.push(ValidationError::InvalidTargetHost(host.clone()));
    }

    let scheme = &config.upstream.scheme;
    if scheme != "http" && scheme != "https" {
        errors.push(ValidationError::InvalidScheme(scheme.clone()));
    }

    match Url::parse(&config.fallback.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidFallbackUrl(config.fallback.url.clone())),
    }

    for (index, rule) in config.rewrite.rules.iter().enumerate() {
        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(ValidationError::InvalidPattern {
                index,
                reason: e.to_string(),
            });
        }
    }

    if config.rewrite.textual_types.iter().all(|t| t.trim().is_empty()) {
        errors.push(ValidationError::EmptyTextualTypes);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("upstream.timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("upstream.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive("timeouts.request_secs"));
    }
    if config.upstream.timeout_secs > 0
        && config.timeouts.request_secs > 0
        && config.timeouts.request_secs <= config.upstream.timeout_secs
    {
        errors.push(ValidationError::DeadlineNotAboveUpstream {
            request: config.timeouts.request_secs,
            upstream: config.upstream.timeout_secs,
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::NotPositive("listener.max_body_bytes"));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let format = &config.observability.log_format;
    if format != "pretty" && format != "json" {
        errors.push(ValidationError::InvalidLogFormat(format.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// A host with an optional port and nothing else: no scheme, path, query or userinfo.
fn is_bare_host(host: &str) -> bool {
    if host.is_empty() || host.contains(['/', '?', '#', '@', ' ']) {
        return false;
    }
    match Url::parse(&format!("https://{host}/")) {
        Ok(url) => url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RuleConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_target_host_rejects_urls() {
        let mut config = ProxyConfig::default();
        config.upstream.target_host = "https://origin.example.com/path".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidTargetHost(_)));

        config.upstream.target_host = "127.0.0.1:9000".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.scheme = "ftp".into();
        config.upstream.timeout_secs = 0;
        config.rewrite.rules.push(RuleConfig::new("[", "x"));
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidScheme("ftp".into())));
        assert!(errors.contains(&ValidationError::NotPositive("upstream.timeout_secs")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPattern { index: 4, .. })));
    }

    #[test]
    fn test_request_deadline_must_exceed_upstream_timeout() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = 1;
        config.upstream.timeout_secs = 5;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DeadlineNotAboveUpstream {
                request: 1,
                upstream: 5
            }])
        );

        config.timeouts.request_secs = 5;
        assert!(validate_config(&config).is_err());

        config.timeouts.request_secs = 6;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert_eq!(validate_config(&config), Ok(()));

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
