//! Media type classification.
//!
//! # Design Decisions
//! - Allow-list: only types known to be text are decoded
//! - Missing or unknown `Content-Type` falls to the binary branch
//! - Case-insensitive substring match, so `application/javascript; charset=utf-8`
//!   and `TEXT/HTML` both count as text

use std::sync::Arc;

/// How a response body is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Safe to decode as UTF-8 and rewrite.
    Textual,
    /// Opaque bytes, passed through untouched.
    Binary,
}

/// Decides whether a declared media type is textual.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    textual_types: Arc<[String]>,
}

impl ContentClassifier {
    pub fn new<I, S>(textual_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let textual_types: Vec<String> = textual_types
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            textual_types: textual_types.into(),
        }
    }

    pub fn classify(&self, content_type: &str) -> ContentClass {
        let content_type = content_type.to_ascii_lowercase();
        if self
            .textual_types
            .iter()
            .any(|t| content_type.contains(t.as_str()))
        {
            ContentClass::Textual
        } else {
            ContentClass::Binary
        }
    }
}
