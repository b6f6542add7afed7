//! VARY Storage - Variant Store Trait and In-Memory Reference Implementation
//!
//! Defines the durable-storage abstraction for contents, variants, and
//! per-user assignment records, plus the cache layer used by the engine.

pub mod cache;

pub use cache::{Cache, CacheStats, InMemoryCache, KeyPattern};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;
use vary_core::{
    new_entity_id, Content, ContentVariant, EntityType, IntegrityError, StorageError,
    VariantAssignment, VaryError, VaryResult,
};

// ============================================================================
// VARIANT STORE TRAIT
// ============================================================================

/// Durable storage for contents, their variants, and sticky per-user
/// assignment records.
///
/// Implementations must enforce two invariants at this layer:
///
/// - (`user_id`, `content_id`) uniqueness for assignments: concurrent
///   first-contact inserts for the same pair collapse to a single row, with
///   the loser receiving [`StorageError::UniqueViolation`].
/// - `set_default_variant` executes its clear+set as a single transaction;
///   no reader may observe a content with zero or more than one default.
#[async_trait]
pub trait VariantStore: Send + Sync {
    // === Content Operations ===

    /// Create a content together with its initial variants, atomically.
    async fn content_create(
        &self,
        content: &Content,
        variants: &[ContentVariant],
    ) -> VaryResult<()>;

    /// Get a content by ID.
    async fn content_get(&self, content_id: Uuid) -> VaryResult<Option<Content>>;

    /// Check whether a content exists.
    async fn content_exists(&self, content_id: Uuid) -> VaryResult<bool>;

    /// Delete a content, cascading to its variants and assignments.
    /// Returns false when the content did not exist.
    async fn content_delete(&self, content_id: Uuid) -> VaryResult<bool>;

    // === Variant Operations ===

    /// Insert a new variant for an existing content.
    ///
    /// When `v.is_default` is set, the content's previous default is demoted
    /// in the same transaction, so the single-default invariant holds at
    /// every observable point.
    async fn variant_insert(&self, v: &ContentVariant) -> VaryResult<()>;

    /// Get a variant by ID.
    async fn variant_get(&self, variant_id: Uuid) -> VaryResult<Option<ContentVariant>>;

    /// List a content's variants, ordered by creation time.
    async fn variants_by_content(&self, content_id: Uuid) -> VaryResult<Vec<ContentVariant>>;

    /// Count a content's variants.
    async fn variant_count(&self, content_id: Uuid) -> VaryResult<usize>;

    /// Get the content's current default variant, or None if it has none.
    ///
    /// Fails with [`IntegrityError::MultipleDefaults`] if more than one
    /// variant is flagged default; that state indicates corruption and is
    /// never silently resolved by picking one.
    async fn default_variant(&self, content_id: Uuid) -> VaryResult<Option<ContentVariant>>;

    /// Make `variant_id` the single default for `content_id`, clearing the
    /// flag on every sibling in the same transaction.
    ///
    /// Rejects variants that do not exist or belong to a different content.
    /// Existing assignments are untouched.
    async fn set_default_variant(&self, content_id: Uuid, variant_id: Uuid) -> VaryResult<()>;

    // === Assignment Operations ===

    /// Get the assignment binding `user_id` to a variant of `content_id`.
    async fn assignment_get(
        &self,
        user_id: Uuid,
        content_id: Uuid,
    ) -> VaryResult<Option<VariantAssignment>>;

    /// Insert-or-touch an assignment.
    ///
    /// First contact inserts a row with `view_count = 1` and both timestamps
    /// set to now. Every later call advances `last_accessed_at` and
    /// `view_count` only; the bound `variant_id` is sticky and the passed
    /// `variant_id` is ignored for existing rows.
    async fn assignment_upsert(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        variant_id: Uuid,
    ) -> VaryResult<VariantAssignment>;

    /// A user's assignment history, most recently accessed first.
    async fn assignments_by_user(&self, user_id: Uuid) -> VaryResult<Vec<VariantAssignment>>;
}

// ============================================================================
// IN-MEMORY REFERENCE IMPLEMENTATION
// ============================================================================

#[derive(Debug, Default)]
struct StoreInner {
    contents: HashMap<Uuid, Content>,
    variants: HashMap<Uuid, ContentVariant>,
    assignments: HashMap<Uuid, VariantAssignment>,
    /// Unique index enforcing one assignment per (user, content) pair.
    assignment_index: HashMap<(Uuid, Uuid), Uuid>,
}

/// In-memory variant store.
///
/// A single `RwLock` over the whole table set gives every multi-step
/// operation (create-with-variants, clear+set default, insert-or-touch) a
/// natural single-writer transaction boundary.
#[derive(Debug, Default)]
pub struct InMemoryVariantStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryVariantStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of stored contents.
    pub fn content_count(&self) -> usize {
        self.inner.read().map(|s| s.contents.len()).unwrap_or(0)
    }

    /// Count of stored assignment rows.
    pub fn assignment_count(&self) -> usize {
        self.inner.read().map(|s| s.assignments.len()).unwrap_or(0)
    }

    fn read(&self) -> VaryResult<std::sync::RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| VaryError::Storage(StorageError::LockPoisoned))
    }

    fn write(&self) -> VaryResult<std::sync::RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| VaryError::Storage(StorageError::LockPoisoned))
    }
}

fn default_variant_of(inner: &StoreInner, content_id: Uuid) -> VaryResult<Option<ContentVariant>> {
    let defaults: Vec<&ContentVariant> = inner
        .variants
        .values()
        .filter(|v| v.content_id == content_id && v.is_default)
        .collect();
    match defaults.len() {
        0 => Ok(None),
        1 => Ok(Some(defaults[0].clone())),
        count => {
            tracing::error!(%content_id, count, "content has multiple default variants");
            Err(VaryError::Integrity(IntegrityError::MultipleDefaults {
                content_id,
                count,
            }))
        }
    }
}

#[async_trait]
impl VariantStore for InMemoryVariantStore {
    // === Content Operations ===

    async fn content_create(
        &self,
        content: &Content,
        variants: &[ContentVariant],
    ) -> VaryResult<()> {
        let mut inner = self.write()?;
        if inner.contents.contains_key(&content.content_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Content,
                reason: "already exists".to_string(),
            }
            .into());
        }
        for v in variants {
            if v.content_id != content.content_id {
                return Err(StorageError::VariantContentMismatch {
                    variant_id: v.variant_id,
                    content_id: content.content_id,
                }
                .into());
            }
            if inner.variants.contains_key(&v.variant_id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::Variant,
                    reason: "already exists".to_string(),
                }
                .into());
            }
        }
        inner.contents.insert(content.content_id, content.clone());
        for v in variants {
            inner.variants.insert(v.variant_id, v.clone());
        }
        Ok(())
    }

    async fn content_get(&self, content_id: Uuid) -> VaryResult<Option<Content>> {
        let inner = self.read()?;
        Ok(inner.contents.get(&content_id).cloned())
    }

    async fn content_exists(&self, content_id: Uuid) -> VaryResult<bool> {
        let inner = self.read()?;
        Ok(inner.contents.contains_key(&content_id))
    }

    async fn content_delete(&self, content_id: Uuid) -> VaryResult<bool> {
        let mut inner = self.write()?;
        if inner.contents.remove(&content_id).is_none() {
            return Ok(false);
        }
        inner.variants.retain(|_, v| v.content_id != content_id);
        inner.assignments.retain(|_, a| a.content_id != content_id);
        inner
            .assignment_index
            .retain(|(_, cid), _| *cid != content_id);
        Ok(true)
    }

    // === Variant Operations ===

    async fn variant_insert(&self, v: &ContentVariant) -> VaryResult<()> {
        let mut inner = self.write()?;
        if !inner.contents.contains_key(&v.content_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Content,
                id: v.content_id,
            }
            .into());
        }
        if inner.variants.contains_key(&v.variant_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Variant,
                reason: "already exists".to_string(),
            }
            .into());
        }
        if v.is_default {
            // Demote the previous default inside the same critical section.
            let now = Utc::now();
            for existing in inner
                .variants
                .values_mut()
                .filter(|e| e.content_id == v.content_id && e.is_default)
            {
                existing.is_default = false;
                existing.updated_at = now;
            }
        }
        inner.variants.insert(v.variant_id, v.clone());
        Ok(())
    }

    async fn variant_get(&self, variant_id: Uuid) -> VaryResult<Option<ContentVariant>> {
        let inner = self.read()?;
        Ok(inner.variants.get(&variant_id).cloned())
    }

    async fn variants_by_content(&self, content_id: Uuid) -> VaryResult<Vec<ContentVariant>> {
        let inner = self.read()?;
        let mut result: Vec<ContentVariant> = inner
            .variants
            .values()
            .filter(|v| v.content_id == content_id)
            .cloned()
            .collect();
        result.sort_by_key(|v| (v.created_at, v.variant_id));
        Ok(result)
    }

    async fn variant_count(&self, content_id: Uuid) -> VaryResult<usize> {
        let inner = self.read()?;
        Ok(inner
            .variants
            .values()
            .filter(|v| v.content_id == content_id)
            .count())
    }

    async fn default_variant(&self, content_id: Uuid) -> VaryResult<Option<ContentVariant>> {
        let inner = self.read()?;
        default_variant_of(&inner, content_id)
    }

    async fn set_default_variant(&self, content_id: Uuid, variant_id: Uuid) -> VaryResult<()> {
        let mut inner = self.write()?;
        match inner.variants.get(&variant_id) {
            None => {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Variant,
                    id: variant_id,
                }
                .into());
            }
            Some(v) if v.content_id != content_id => {
                return Err(StorageError::VariantContentMismatch {
                    variant_id,
                    content_id,
                }
                .into());
            }
            Some(_) => {}
        }
        // Clear and set under the same write guard: readers observe either
        // the old default-consistent state or the new one, nothing between.
        let now = Utc::now();
        for v in inner
            .variants
            .values_mut()
            .filter(|v| v.content_id == content_id)
        {
            let make_default = v.variant_id == variant_id;
            if v.is_default != make_default {
                v.is_default = make_default;
                v.updated_at = now;
            }
        }
        Ok(())
    }

    // === Assignment Operations ===

    async fn assignment_get(
        &self,
        user_id: Uuid,
        content_id: Uuid,
    ) -> VaryResult<Option<VariantAssignment>> {
        let inner = self.read()?;
        Ok(inner
            .assignment_index
            .get(&(user_id, content_id))
            .and_then(|id| inner.assignments.get(id))
            .cloned())
    }

    async fn assignment_upsert(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        variant_id: Uuid,
    ) -> VaryResult<VariantAssignment> {
        let mut inner = self.write()?;
        let now = Utc::now();

        if let Some(assignment_id) = inner.assignment_index.get(&(user_id, content_id)).copied() {
            let assignment = inner.assignments.get_mut(&assignment_id).ok_or(
                VaryError::Storage(StorageError::NotFound {
                    entity_type: EntityType::Assignment,
                    id: assignment_id,
                }),
            )?;
            // Sticky: the stored variant binding never changes on touch.
            assignment.last_accessed_at = now;
            assignment.view_count += 1;
            return Ok(assignment.clone());
        }

        match inner.variants.get(&variant_id) {
            None => {
                return Err(StorageError::NotFound {
                    entity_type: EntityType::Variant,
                    id: variant_id,
                }
                .into());
            }
            Some(v) if v.content_id != content_id => {
                return Err(StorageError::VariantContentMismatch {
                    variant_id,
                    content_id,
                }
                .into());
            }
            Some(_) => {}
        }

        let assignment = VariantAssignment {
            assignment_id: new_entity_id(),
            user_id,
            content_id,
            variant_id,
            first_viewed_at: now,
            last_accessed_at: now,
            view_count: 1,
        };
        inner
            .assignment_index
            .insert((user_id, content_id), assignment.assignment_id);
        inner
            .assignments
            .insert(assignment.assignment_id, assignment.clone());
        Ok(assignment)
    }

    async fn assignments_by_user(&self, user_id: Uuid) -> VaryResult<Vec<VariantAssignment>> {
        let inner = self.read()?;
        let mut result: Vec<VariantAssignment> = inner
            .assignments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.last_accessed_at.cmp(&a.last_accessed_at));
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_test_content() -> Content {
        Content {
            content_id: new_entity_id(),
            title: "Test content".to_string(),
            description: "Test description".to_string(),
            language: "en".to_string(),
            author_id: new_entity_id(),
            category_id: new_entity_id(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_test_variant(content_id: Uuid, is_default: bool) -> ContentVariant {
        ContentVariant {
            variant_id: new_entity_id(),
            content_id,
            data: "variant payload".to_string(),
            is_default,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seed_content(store: &InMemoryVariantStore) -> (Content, ContentVariant, ContentVariant)
    {
        let content = make_test_content();
        let v1 = make_test_variant(content.content_id, true);
        let v2 = make_test_variant(content.content_id, false);
        store
            .content_create(&content, &[v1.clone(), v2.clone()])
            .await
            .unwrap();
        (content, v1, v2)
    }

    // ========================================================================
    // Content Tests
    // ========================================================================

    #[tokio::test]
    async fn test_content_create_get() {
        let store = InMemoryVariantStore::new();
        let (content, _, _) = seed_content(&store).await;

        let retrieved = store.content_get(content.content_id).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().content_id, content.content_id);
        assert_eq!(store.content_count(), 1);
    }

    #[tokio::test]
    async fn test_content_create_duplicate() {
        let store = InMemoryVariantStore::new();
        let (content, v1, _) = seed_content(&store).await;

        let result = store.content_create(&content, &[v1]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_content_create_rejects_foreign_variant() {
        let store = InMemoryVariantStore::new();
        let content = make_test_content();
        let stray = make_test_variant(new_entity_id(), true);

        let result = store.content_create(&content, &[stray]).await;
        assert!(matches!(
            result,
            Err(VaryError::Storage(
                StorageError::VariantContentMismatch { .. }
            ))
        ));
        // Nothing partially written.
        assert_eq!(store.content_count(), 0);
    }

    #[tokio::test]
    async fn test_content_delete_cascades() {
        let store = InMemoryVariantStore::new();
        let (content, v1, _) = seed_content(&store).await;
        let user = new_entity_id();
        store
            .assignment_upsert(user, content.content_id, v1.variant_id)
            .await
            .unwrap();

        let removed = store.content_delete(content.content_id).await.unwrap();
        assert!(removed);
        assert!(store.content_get(content.content_id).await.unwrap().is_none());
        assert!(store.variant_get(v1.variant_id).await.unwrap().is_none());
        assert!(store
            .assignment_get(user, content.content_id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.assignment_count(), 0);
    }

    #[tokio::test]
    async fn test_content_delete_missing_returns_false() {
        let store = InMemoryVariantStore::new();
        let removed = store.content_delete(new_entity_id()).await.unwrap();
        assert!(!removed);
    }

    // ========================================================================
    // Variant Tests
    // ========================================================================

    #[tokio::test]
    async fn test_variant_insert_requires_content() {
        let store = InMemoryVariantStore::new();
        let stray = make_test_variant(new_entity_id(), false);

        let result = store.variant_insert(&stray).await;
        assert!(matches!(
            result,
            Err(VaryError::Storage(StorageError::NotFound {
                entity_type: EntityType::Content,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_variant_insert_default_demotes_previous() {
        let store = InMemoryVariantStore::new();
        let (content, v1, _) = seed_content(&store).await;

        let v3 = make_test_variant(content.content_id, true);
        store.variant_insert(&v3).await.unwrap();

        let default = store
            .default_variant(content.content_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.variant_id, v3.variant_id);
        let old = store.variant_get(v1.variant_id).await.unwrap().unwrap();
        assert!(!old.is_default);
    }

    #[tokio::test]
    async fn test_variants_by_content_ordered_by_creation() {
        let store = InMemoryVariantStore::new();
        let (content, v1, v2) = seed_content(&store).await;
        let v3 = make_test_variant(content.content_id, false);
        store.variant_insert(&v3).await.unwrap();

        let variants = store.variants_by_content(content.content_id).await.unwrap();
        assert_eq!(variants.len(), 3);
        assert!(variants[0].created_at <= variants[1].created_at);
        assert!(variants[1].created_at <= variants[2].created_at);
        let ids: Vec<Uuid> = variants.iter().map(|v| v.variant_id).collect();
        assert!(ids.contains(&v1.variant_id));
        assert!(ids.contains(&v2.variant_id));
    }

    #[tokio::test]
    async fn test_set_default_variant_swaps_flag() {
        let store = InMemoryVariantStore::new();
        let (content, v1, v2) = seed_content(&store).await;

        store
            .set_default_variant(content.content_id, v2.variant_id)
            .await
            .unwrap();

        let default = store
            .default_variant(content.content_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.variant_id, v2.variant_id);
        let old = store.variant_get(v1.variant_id).await.unwrap().unwrap();
        assert!(!old.is_default);
    }

    #[tokio::test]
    async fn test_set_default_variant_rejects_unknown_variant() {
        let store = InMemoryVariantStore::new();
        let (content, _, _) = seed_content(&store).await;

        let result = store
            .set_default_variant(content.content_id, new_entity_id())
            .await;
        assert!(matches!(
            result,
            Err(VaryError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_set_default_variant_rejects_foreign_variant() {
        let store = InMemoryVariantStore::new();
        let (content_a, _, _) = seed_content(&store).await;
        let (_, other_v1, _) = seed_content(&store).await;

        let result = store
            .set_default_variant(content_a.content_id, other_v1.variant_id)
            .await;
        assert!(matches!(
            result,
            Err(VaryError::Storage(
                StorageError::VariantContentMismatch { .. }
            ))
        ));
        // The original default is untouched by the rejected call.
        let default = store
            .default_variant(content_a.content_id)
            .await
            .unwrap()
            .unwrap();
        assert!(default.is_default);
    }

    #[tokio::test]
    async fn test_default_variant_none_when_content_empty() {
        let store = InMemoryVariantStore::new();
        let default = store.default_variant(new_entity_id()).await.unwrap();
        assert!(default.is_none());
    }

    // ========================================================================
    // Assignment Tests
    // ========================================================================

    #[tokio::test]
    async fn test_assignment_upsert_inserts_then_touches() {
        let store = InMemoryVariantStore::new();
        let (content, v1, _) = seed_content(&store).await;
        let user = new_entity_id();

        let first = store
            .assignment_upsert(user, content.content_id, v1.variant_id)
            .await
            .unwrap();
        assert_eq!(first.view_count, 1);
        assert_eq!(first.first_viewed_at, first.last_accessed_at);

        let second = store
            .assignment_upsert(user, content.content_id, v1.variant_id)
            .await
            .unwrap();
        assert_eq!(second.assignment_id, first.assignment_id);
        assert_eq!(second.view_count, 2);
        assert_eq!(second.first_viewed_at, first.first_viewed_at);
        assert!(second.last_accessed_at >= first.last_accessed_at);
        assert_eq!(store.assignment_count(), 1);
    }

    #[tokio::test]
    async fn test_assignment_upsert_is_sticky_against_other_variant() {
        let store = InMemoryVariantStore::new();
        let (content, v1, v2) = seed_content(&store).await;
        let user = new_entity_id();

        store
            .assignment_upsert(user, content.content_id, v1.variant_id)
            .await
            .unwrap();
        // A touch carrying a different variant id must not rebind.
        let touched = store
            .assignment_upsert(user, content.content_id, v2.variant_id)
            .await
            .unwrap();
        assert_eq!(touched.variant_id, v1.variant_id);
        assert_eq!(touched.view_count, 2);
    }

    #[tokio::test]
    async fn test_assignment_upsert_rejects_unknown_variant() {
        let store = InMemoryVariantStore::new();
        let (content, _, _) = seed_content(&store).await;

        let result = store
            .assignment_upsert(new_entity_id(), content.content_id, new_entity_id())
            .await;
        assert!(matches!(
            result,
            Err(VaryError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_assignments_by_user_most_recent_first() {
        let store = InMemoryVariantStore::new();
        let (content_a, a1, _) = seed_content(&store).await;
        let (content_b, b1, _) = seed_content(&store).await;
        let user = new_entity_id();

        store
            .assignment_upsert(user, content_a.content_id, a1.variant_id)
            .await
            .unwrap();
        store
            .assignment_upsert(user, content_b.content_id, b1.variant_id)
            .await
            .unwrap();
        // Touch content_a again so it becomes the most recent access.
        store
            .assignment_upsert(user, content_a.content_id, a1.variant_id)
            .await
            .unwrap();

        let history = store.assignments_by_user(user).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content_id, content_a.content_id);
        assert!(history[0].last_accessed_at >= history[1].last_accessed_at);
    }

    #[tokio::test]
    async fn test_assignments_by_user_empty() {
        let store = InMemoryVariantStore::new();
        let history = store.assignments_by_user(new_entity_id()).await.unwrap();
        assert!(history.is_empty());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn make_content() -> Content {
        Content {
            content_id: new_entity_id(),
            title: "Prop content".to_string(),
            description: String::new(),
            language: "en".to_string(),
            author_id: new_entity_id(),
            category_id: new_entity_id(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_variant(content_id: Uuid, is_default: bool) -> ContentVariant {
        ContentVariant {
            variant_id: new_entity_id(),
            content_id,
            data: "payload".to_string(),
            is_default,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn count_defaults(variants: &[ContentVariant]) -> usize {
        variants.iter().filter(|v| v.is_default).count()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: after any sequence of set_default_variant calls, exactly
        /// one variant carries the default flag.
        #[test]
        fn prop_single_default_after_switch_sequence(
            switches in proptest::collection::vec(0usize..4, 1..20)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let store = InMemoryVariantStore::new();
                let content = make_content();
                let variants: Vec<ContentVariant> = (0..4)
                    .map(|i| make_variant(content.content_id, i == 0))
                    .collect();
                store.content_create(&content, &variants).await.unwrap();

                for idx in switches {
                    store
                        .set_default_variant(content.content_id, variants[idx].variant_id)
                        .await
                        .unwrap();
                    let current = store
                        .variants_by_content(content.content_id)
                        .await
                        .unwrap();
                    prop_assert_eq!(count_defaults(&current), 1);
                }
                Ok(())
            })?;
        }

        /// Property: N upserts for the same pair yield view_count == N and a
        /// single assignment row with an unchanged variant binding.
        #[test]
        fn prop_upsert_counts_views_exactly(n in 1usize..25) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let store = InMemoryVariantStore::new();
                let content = make_content();
                let v1 = make_variant(content.content_id, true);
                let v2 = make_variant(content.content_id, false);
                store
                    .content_create(&content, &[v1.clone(), v2.clone()])
                    .await
                    .unwrap();

                let user = new_entity_id();
                let mut last = None;
                for _ in 0..n {
                    last = Some(
                        store
                            .assignment_upsert(user, content.content_id, v1.variant_id)
                            .await
                            .unwrap(),
                    );
                }
                let last = last.expect("at least one upsert");
                prop_assert_eq!(last.view_count, n as i64);
                prop_assert_eq!(last.variant_id, v1.variant_id);
                prop_assert_eq!(store.assignment_count(), 1);
                Ok(())
            })?;
        }

        /// Property: lookups of never-written ids return Ok(None).
        #[test]
        fn prop_not_found_returns_none(_dummy in any::<u8>()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let store = InMemoryVariantStore::new();
                let id = new_entity_id();
                prop_assert!(store.content_get(id).await.unwrap().is_none());
                prop_assert!(store.variant_get(id).await.unwrap().is_none());
                prop_assert!(store.assignment_get(id, id).await.unwrap().is_none());
                Ok(())
            })?;
        }
    }
}
