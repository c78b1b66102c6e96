//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (from http::request)
//!     → dispatcher.rs (send, follow redirects, classify status)
//!     → UpstreamResponse (status < 400, body buffered)
//!     → or ProxyError (status >= 400, transport failure)
//! ```

pub mod dispatcher;

pub use dispatcher::{Dispatcher, OutboundRequest, UpstreamResponse};
