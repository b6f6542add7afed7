//! VARY Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod entities;
pub mod error;

pub use entities::{
    Content, ContentVariant, ContentView, NewContent, NewVariant, VariantAssignment,
};
pub use error::{CacheError, IntegrityError, StorageError, VaryError, VaryResult};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

// ============================================================================
// ENUMS
// ============================================================================

/// Entity type discriminator for error payloads and polymorphic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Content,
    Variant,
    Assignment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_unique() {
        let a = new_entity_id();
        let b = new_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_entity_ids_sort_by_creation() {
        // UUIDv7 ids embed a timestamp, so successive ids never sort backwards.
        let a = new_entity_id();
        let b = new_entity_id();
        assert!(a <= b);
    }

    #[test]
    fn test_entity_type_serde_roundtrip() {
        for et in [EntityType::Content, EntityType::Variant, EntityType::Assignment] {
            let json = serde_json::to_string(&et).unwrap();
            let back: EntityType = serde_json::from_str(&json).unwrap();
            assert_eq!(et, back);
        }
    }
}
