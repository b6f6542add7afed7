//! Engine configuration.

use std::time::Duration;

/// Configuration for the variant resolution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// TTL for whole-content cache entries (not user-specific).
    pub content_ttl: Duration,
    /// TTL for per-(user, content) composite views. Kept short because these
    /// entries embed user-specific data and must not outlive an admin
    /// default change by much.
    pub user_content_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_ttl: Duration::from_secs(15 * 60),
            user_content_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl EngineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content-entry TTL.
    pub fn with_content_ttl(mut self, ttl: Duration) -> Self {
        self.content_ttl = ttl;
        self
    }

    /// Set the per-user composite view TTL.
    pub fn with_user_content_ttl(mut self, ttl: Duration) -> Self {
        self.user_content_ttl = ttl;
        self
    }
}
