//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! axum server (server.rs)          function event (envelope.rs)
//!         \                              /
//!          → InboundRequest (request.rs) ←
//!     → handler.rs (preflight | translate → dispatch → rewrite)
//!     → response.rs (headers, cache policy, fallback)
//!     → axum Response | FunctionResponse (base64 for binary)
//! ```

pub mod envelope;
pub mod handler;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use envelope::{invoke, FunctionEvent, FunctionResponse};
pub use handler::ProxyHandler;
pub use request::InboundRequest;
pub use response::{OutboundResponse, ResponseBody};
pub use server::HttpServer;
