//! Ordered body substitution rules.

use std::borrow::Cow;
use std::sync::Arc;

use regex::{NoExpand, Regex};

use crate::config::RuleConfig;

/// A precompiled pattern and the literal text that replaces each match.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Replace every match. The replacement is literal, `$1` is not expanded.
    ///
    /// A match that is a strict prefix of the replacement, with the rest of the
    /// replacement following it, is left alone, so `@connect greasyfork.org.cn`
    /// is not rewritten again. Shortening rules always apply.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.replacement.is_empty() {
            return self.pattern.replace_all(text, NoExpand(""));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut changed = false;
        for m in self.pattern.find_iter(text) {
            if self.replacement.len() > m.len()
                && text[m.start()..].starts_with(self.replacement.as_str())
            {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            out.push_str(&self.replacement);
            last = m.end();
            changed = true;
        }

        if !changed {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }
}

/// The immutable, ordered rule list shared by every request.
///
/// Each rule runs over the output of the rule before it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Arc<[RewriteRule]>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules: rules.into() }
    }

    /// Compile the configured rules, preserving their order.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self, regex::Error> {
        let compiled = rules
            .iter()
            .map(|r| RewriteRule::new(&r.pattern, r.replacement.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(compiled))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `text` in declaration order.
    ///
    /// Empty input is returned as is.
    pub fn apply(&self, text: String) -> String {
        if text.is_empty() {
            return text;
        }
        self.rules.iter().fold(text, |current, rule| match rule.apply(&current) {
            Cow::Borrowed(_) => current,
            Cow::Owned(rewritten) => rewritten,
        })
    }
}
