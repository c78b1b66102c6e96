//! The proxy pipeline.
//!
//! ```text
//! InboundRequest
//!     → OPTIONS? → preflight (upstream never contacted)
//!     → request::translate → Dispatcher::dispatch
//!     → classify Content-Type → rewrite text / pass bytes through
//!     → ResponsePolicy::assemble
//!     → any ProxyError or elapsed deadline → ResponsePolicy::fallback
//! ```
//!
//! Exactly one `OutboundResponse` comes out of `handle`, whatever happens.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::Method;

use crate::config::ProxyConfig;
use crate::error::{InitError, ProxyError};
use crate::http::request::{translate, InboundRequest};
use crate::http::response::{OutboundResponse, ResponseBody, ResponsePolicy};
use crate::observability::metrics::{self, Outcome};
use crate::rewrite::{ContentClass, ContentClassifier, RuleSet};
use crate::upstream::{Dispatcher, UpstreamResponse};

/// Per-process proxy state. Everything in here is read-only after `new`.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    config: Arc<ProxyConfig>,
    rules: RuleSet,
    classifier: ContentClassifier,
    policy: ResponsePolicy,
    dispatcher: Dispatcher,
    request_timeout: Duration,
}

impl ProxyHandler {
    pub fn new(config: ProxyConfig) -> Result<Self, InitError> {
        let rules = RuleSet::from_config(&config.rewrite.rules)?;
        let classifier = ContentClassifier::new(&config.rewrite.textual_types);
        let policy = ResponsePolicy::new(&config)?;
        let dispatcher = Dispatcher::new(&config.upstream)?;
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        tracing::info!(
            target_host = %config.upstream.target_host,
            rules = rules.len(),
            fallback = %config.fallback.url,
            "Proxy handler ready"
        );

        Ok(Self {
            config: Arc::new(config),
            rules,
            classifier,
            policy,
            dispatcher,
            request_timeout,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The fallback redirect, for failures that happen before `handle`.
    pub fn fallback(&self) -> OutboundResponse {
        self.policy.fallback()
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        let start = Instant::now();
        let method = request.method.clone();
        let path = request.path.clone();
        let request_id = request.request_id().to_string();

        if method == Method::OPTIONS {
            tracing::debug!(request_id = %request_id, path = %path, "Answering preflight");
            metrics::record_request(method.as_str(), Outcome::Preflight, start);
            return self.policy.preflight();
        }

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Proxying request"
        );

        let deadline = tokio::time::timeout(self.request_timeout, self.forward(request));
        let result = match deadline.await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    kind = "deadline",
                    timeout_secs = self.request_timeout.as_secs(),
                    "Request deadline elapsed, falling back"
                );
                metrics::record_request(method.as_str(), Outcome::Fallback, start);
                return self.policy.fallback();
            }
        };

        match result {
            Ok((response, outcome)) => {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = %response.status,
                    outcome = outcome.as_str(),
                    bytes = response.body.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Request proxied"
                );
                metrics::record_request(method.as_str(), outcome, start);
                response
            }
            Err(e) => {
                match &e {
                    ProxyError::UpstreamStatus(_) => tracing::warn!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        kind = e.kind(),
                        error = %e,
                        "Falling back"
                    ),
                    _ => tracing::error!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        kind = e.kind(),
                        error = %e,
                        "Proxy error, falling back"
                    ),
                }
                metrics::record_request(method.as_str(), Outcome::Fallback, start);
                self.policy.fallback()
            }
        }
    }

    async fn forward(
        &self,
        request: InboundRequest,
    ) -> Result<(OutboundResponse, Outcome), ProxyError> {
        let outbound = translate(request, &self.config.upstream)?;
        let requested_url = outbound.url.clone();
        let upstream = self.dispatcher.dispatch(outbound).await?;
        if upstream.final_url != requested_url {
            tracing::debug!(
                requested = %requested_url,
                final_url = %upstream.final_url,
                "Followed upstream redirect"
            );
        }
        let (body, outcome) = self.transform_body(&upstream)?;
        let UpstreamResponse {
            status, headers, ..
        } = upstream;
        Ok((self.policy.assemble(status, headers, body), outcome))
    }

    /// Rewrite textual bodies, pass everything else through.
    fn transform_body(
        &self,
        upstream: &UpstreamResponse,
    ) -> Result<(ResponseBody, Outcome), ProxyError> {
        match self.classifier.classify(upstream.content_type()) {
            ContentClass::Binary => Ok((
                ResponseBody::Binary(upstream.body.clone()),
                Outcome::Passthrough,
            )),
            ContentClass::Textual => {
                let text = std::str::from_utf8(&upstream.body)?;
                if text.is_empty() {
                    return Ok((ResponseBody::Empty, Outcome::Rewritten));
                }
                let rewritten = self.rules.apply(text.to_owned());
                metrics::record_rewrite();
                Ok((ResponseBody::Text(rewritten), Outcome::Rewritten))
            }
        }
    }
}
