//! Response body rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! upstream Content-Type
//!     → classify.rs (allow-list: textual or binary)
//!     → textual: decode UTF-8 → rules.rs (ordered global substitutions)
//!     → binary: bytes unchanged
//! ```

pub mod classify;
pub mod rules;

pub use classify::{ContentClass, ContentClassifier};
pub use rules::{RewriteRule, RuleSet};
