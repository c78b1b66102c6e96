//! Rewriting edge proxy library.
//!
//! Forwards every request to one fixed upstream, rewrites textual response
//! bodies with an ordered list of substitutions, and answers any failure with
//! a redirect to a fallback URL.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::{InitError, ProxyError};
pub use http::{HttpServer, ProxyHandler};
pub use lifecycle::Shutdown;
