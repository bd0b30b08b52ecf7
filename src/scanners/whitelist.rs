//! Whitelist matching for raw security matches
//!
//! Entries containing `*` or `?` are anchored, case-insensitive globs
//! (`192.168.*`, `your-*`). Anything else is a case-insensitive substring
//! (`localhost`, `CHANGEME`).

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Whitelist {
    substrings: Vec<String>,
    globs: GlobSet,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Whitelist {
    pub fn new(patterns: &[String]) -> Self {
        let mut substrings = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            if !pattern.contains(['*', '?']) {
                substrings.push(pattern.to_lowercase());
                continue;
            }
            match GlobBuilder::new(&escape_glob_syntax(pattern))
                .case_insensitive(true)
                .literal_separator(false)
                .backslash_escape(true)
                .build()
            {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    // Still honour the entry, just literally
                    warn!("Whitelist pattern '{}' is not a valid glob: {}", pattern, e);
                    substrings.push(pattern.to_lowercase());
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            warn!("Failed to build whitelist globs: {}", e);
            GlobSet::empty()
        });

        Self { substrings, globs }
    }

    /// Whether a single piece of text hits any entry
    pub fn allows(&self, text: &str) -> bool {
        let text = text.trim().trim_matches(|c| c == '"' || c == '\'');
        if text.is_empty() {
            return false;
        }
        if self.globs.is_match(text) {
            return true;
        }
        let lower = text.to_lowercase();
        self.substrings.iter().any(|s| lower.contains(s.as_str()))
    }

    /// A raw match is suppressed when either its captured value or the full
    /// matched text hits the whitelist
    pub fn suppresses(&self, value: Option<&str>, full_match: &str) -> bool {
        value.map(|v| self.allows(v)).unwrap_or(false) || self.allows(full_match)
    }
}

/// Only `*` and `?` are wildcards; braces and brackets are literal
fn escape_glob_syntax(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '{' | '}' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
