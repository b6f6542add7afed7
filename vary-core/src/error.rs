//! Error types for VARY operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Unique constraint violated for assignment (user {user_id}, content {content_id})")]
    UniqueViolation { user_id: Uuid, content_id: Uuid },

    #[error("Variant {variant_id} does not belong to content {content_id}")]
    VariantContentMismatch {
        variant_id: Uuid,
        content_id: Uuid,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache layer errors. Always recoverable: the engine falls through to the
/// durable path on any of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache serialization failed for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Invariant violations in the variant data itself. These indicate corrupted
/// durable state and are surfaced loudly rather than papered over.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Content {content_id} has variants but no default variant")]
    NoDefaultVariant { content_id: Uuid },

    #[error("Content {content_id} has {count} default variants")]
    MultipleDefaults { content_id: Uuid, count: usize },

    #[error("Assignment {assignment_id} references missing variant {variant_id}")]
    DanglingAssignment {
        assignment_id: Uuid,
        variant_id: Uuid,
    },
}

/// Master error type for all VARY errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl VaryError {
    /// True when the error is an absence rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaryError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for VARY operations.
pub type VaryResult<T> = Result<T, VaryError>;

// =============================================================================
// TESTS
// =============================================================================
