//! Glob patterns for bulk cache invalidation.

use regex::{Regex, RegexBuilder};
use vary_core::{CacheError, VaryResult};

/// A precompiled key pattern.
///
/// `*` matches any run of characters (including none); every other character
/// matches literally. The pattern is anchored to the full key, so
/// `contents:*` matches `contents:all` but not `users:contents:all`.
/// Matching is case-insensitive.
///
/// Compile once per invalidation call and reuse across the candidate key
/// set; compilation is the expensive part.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    /// Compile a glob pattern.
    pub fn compile(pattern: &str) -> VaryResult<Self> {
        let escaped = regex::escape(pattern).replace("\\*", ".*");
        let anchored = format!("^{escaped}$");
        let regex = RegexBuilder::new(&anchored)
            .case_insensitive(true)
            .build()
            .map_err(|e| CacheError::Unavailable {
                reason: format!("invalid key pattern {pattern:?}: {e}"),
            })?;
        Ok(Self { regex })
    }

    /// Test a key against the pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
