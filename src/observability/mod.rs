//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy pipeline produces:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout / stderr log collection
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every pipeline log line
//! - Metrics are disabled by default; recording without a recorder is free

pub mod logging;
pub mod metrics;
