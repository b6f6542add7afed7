//! Entity definitions for contents, variants, and assignment records.
//!
//! All relationships are expressed as plain ids. Nothing here holds a live
//! object graph; joins are performed explicitly by the store collaborator.

use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// A content item that owns one or more interchangeable variants.
///
/// The engine treats the content row itself as mostly opaque metadata; the
/// interesting state lives in its variants and in per-user assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub content_id: EntityId,
    pub title: String,
    pub description: String,
    /// Language code, e.g. "en" or "tr".
    pub language: String,
    pub author_id: EntityId,
    pub category_id: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One alternate rendering of a content item.
///
/// Invariant: at most one variant per content has `is_default = true`, and a
/// content with at least one variant has exactly one default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVariant {
    pub variant_id: EntityId,
    pub content_id: EntityId,
    /// Opaque payload. The engine never interprets it.
    pub data: String,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Durable sticky binding of a user to a specific variant of a content.
///
/// The (`user_id`, `content_id`) pair is unique. Once written, `variant_id`
/// never changes; later accesses only advance the telemetry fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAssignment {
    pub assignment_id: EntityId,
    pub user_id: EntityId,
    pub content_id: EntityId,
    pub variant_id: EntityId,
    /// Immutable after creation.
    pub first_viewed_at: Timestamp,
    pub last_accessed_at: Timestamp,
    pub view_count: i64,
}

/// Composite read-path result: a content together with the variant resolved
/// for one specific user. Never shared across users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentView {
    pub content: Content,
    pub variant: ContentVariant,
    pub variant_count: usize,
}

/// Creation payload for a content and its initial variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub description: String,
    pub language: String,
    pub author_id: EntityId,
    pub category_id: EntityId,
    pub variants: Vec<NewVariant>,
}

/// Creation payload for a single variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVariant {
    pub data: String,
    pub is_default: bool,
}
