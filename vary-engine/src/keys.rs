//! Cache key derivation.
//!
//! All keys produced by the engine share the `contents` prefix so a single
//! glob can sweep every content-derived read view.

use uuid::Uuid;

/// Prefix shared by every content-derived cache key.
pub const CONTENT_KEY_PREFIX: &str = "contents";

/// Key for a single content row: `contents:{content_id}`.
pub fn content_key(content_id: Uuid) -> String {
    format!("{CONTENT_KEY_PREFIX}:{content_id}")
}

/// Key for a per-user composite view:
/// `contents:user-content:{user_id}:{content_id}`.
pub fn user_content_key(user_id: Uuid, content_id: Uuid) -> String {
    format!("{CONTENT_KEY_PREFIX}:user-content:{user_id}:{content_id}")
}

/// Glob matching every content-derived key.
pub fn content_pattern() -> String {
    format!("{CONTENT_KEY_PREFIX}:*")
}
