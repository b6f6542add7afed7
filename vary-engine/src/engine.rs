//! The variant resolution engine.
//!
//! Orchestrates the sticky assignment policy on top of a [`VariantStore`]
//! and accelerates the composite read path through a [`Cache`]. The cache is
//! never authoritative: durable telemetry advances on every logical read,
//! and any failure in the cache degrades to the durable path.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use vary_core::{
    new_entity_id, Content, ContentVariant, ContentView, EntityType, IntegrityError, NewContent,
    NewVariant, StorageError, VariantAssignment, VaryError, VaryResult,
};
use vary_storage::{Cache, VariantStore};

use crate::config::EngineConfig;
use crate::keys;

/// Stateful variant resolution engine.
///
/// # Type Parameters
///
/// - `S`: the durable variant store collaborator
/// - `C`: the cache backend
pub struct VariantEngine<S, C>
where
    S: VariantStore,
    C: Cache,
{
    store: Arc<S>,
    cache: Arc<C>,
    config: EngineConfig,
}

impl<S, C> VariantEngine<S, C>
where
    S: VariantStore,
    C: Cache,
{
    /// Create a new engine.
    pub fn new(store: Arc<S>, cache: Arc<C>, config: EngineConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Create a new engine with default configuration.
    pub fn with_defaults(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(store, cache, EngineConfig::default())
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a reference to the store collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the cache backend.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Decide which variant `user_id` sees for `content_id`.
    ///
    /// The first contact binds the user to the content's current default
    /// variant; every later contact returns the originally bound variant,
    /// regardless of default changes since. Each call performs exactly one
    /// durable write: the insert of the binding, or the touch advancing
    /// `last_accessed_at` and `view_count`.
    ///
    /// Two concurrent first contacts for the same pair collapse to a single
    /// assignment row; the loser reads the winner's binding instead of
    /// surfacing the conflict.
    pub async fn resolve_variant_for_user(
        &self,
        content_id: Uuid,
        user_id: Uuid,
    ) -> VaryResult<ContentVariant> {
        if let Some(existing) = self.store.assignment_get(user_id, content_id).await? {
            let variant = self
                .store
                .variant_get(existing.variant_id)
                .await?
                .ok_or_else(|| dangling_assignment(&existing))?;
            self.store
                .assignment_upsert(user_id, content_id, existing.variant_id)
                .await?;
            return Ok(variant);
        }

        let default = match self.store.default_variant(content_id).await? {
            Some(v) => v,
            None => return Err(self.missing_default(content_id).await),
        };

        match self
            .store
            .assignment_upsert(user_id, content_id, default.variant_id)
            .await
        {
            Ok(assignment) if assignment.variant_id == default.variant_id => Ok(default),
            Ok(assignment) => {
                // Another first contact won between our lookup and the
                // upsert; its binding is authoritative.
                self.store
                    .variant_get(assignment.variant_id)
                    .await?
                    .ok_or_else(|| dangling_assignment(&assignment))
            }
            Err(VaryError::Storage(StorageError::UniqueViolation { .. })) => {
                tracing::debug!(%content_id, %user_id, "lost first-contact race, reading winner");
                let winner = self
                    .store
                    .assignment_upsert(user_id, content_id, default.variant_id)
                    .await?;
                self.store
                    .variant_get(winner.variant_id)
                    .await?
                    .ok_or_else(|| dangling_assignment(&winner))
            }
            Err(e) => Err(e),
        }
    }

    /// Cache-accelerated composite read: the content together with the
    /// variant resolved for this user.
    ///
    /// On a cache hit the cached body is reused but the durable history
    /// still advances; if that touch fails, the call falls through to full
    /// resolution rather than returning a view whose telemetry never landed.
    /// Cache read and population failures are absorbed.
    ///
    /// Returns `Ok(None)` when the content does not exist.
    pub async fn get_content_for_user(
        &self,
        content_id: Uuid,
        user_id: Uuid,
    ) -> VaryResult<Option<ContentView>> {
        let key = keys::user_content_key(user_id, content_id);

        match self.cache.get::<ContentView>(&key).await {
            Ok(Some(view)) => {
                match self
                    .store
                    .assignment_upsert(user_id, content_id, view.variant.variant_id)
                    .await
                {
                    Ok(_) => return Ok(Some(view)),
                    Err(e) => {
                        tracing::warn!(error = %e, %content_id, %user_id,
                            "history touch failed for cached view, resolving durably");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, key, "cache read failed, resolving durably");
            }
        }

        let Some(content) = self.store.content_get(content_id).await? else {
            return Ok(None);
        };
        let variant = self.resolve_variant_for_user(content_id, user_id).await?;
        let variant_count = self.store.variant_count(content_id).await?;
        let view = ContentView {
            content,
            variant,
            variant_count,
        };

        if let Err(e) = self
            .cache
            .set(&key, &view, Some(self.config.user_content_ttl))
            .await
        {
            tracing::warn!(error = %e, key, "cache populate failed");
        }
        Ok(Some(view))
    }

    /// Cache-accelerated single content lookup (no user-specific data).
    pub async fn get_content(&self, content_id: Uuid) -> VaryResult<Option<Content>> {
        let key = keys::content_key(content_id);

        match self.cache.get::<Content>(&key).await {
            Ok(Some(content)) => return Ok(Some(content)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, key, "cache read failed, resolving durably");
            }
        }

        let Some(content) = self.store.content_get(content_id).await? else {
            return Ok(None);
        };
        if let Err(e) = self
            .cache
            .set(&key, &content, Some(self.config.content_ttl))
            .await
        {
            tracing::warn!(error = %e, key, "cache populate failed");
        }
        Ok(Some(content))
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Create a content with its initial variants, atomically.
    ///
    /// Rules: at least two variants; at most one marked default; when none
    /// is marked, the first supplied variant becomes the default.
    pub async fn create_content(&self, new: NewContent) -> VaryResult<Content> {
        if new.variants.len() < 2 {
            return Err(VaryError::Validation(
                "at least two variants are required".to_string(),
            ));
        }
        let default_count = new.variants.iter().filter(|v| v.is_default).count();
        if default_count > 1 {
            return Err(VaryError::Validation(
                "at most one variant may be marked default".to_string(),
            ));
        }

        let now = Utc::now();
        let content = Content {
            content_id: new_entity_id(),
            title: new.title,
            description: new.description,
            language: new.language,
            author_id: new.author_id,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
        };
        let variants: Vec<ContentVariant> = new
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| ContentVariant {
                variant_id: new_entity_id(),
                content_id: content.content_id,
                data: v.data.clone(),
                is_default: v.is_default || (default_count == 0 && i == 0),
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.store.content_create(&content, &variants).await?;
        self.invalidate_all().await;
        Ok(content)
    }

    /// Add a variant to an existing content.
    ///
    /// A variant added as default demotes the previous default in the same
    /// store transaction.
    pub async fn add_variant(
        &self,
        content_id: Uuid,
        new: NewVariant,
    ) -> VaryResult<ContentVariant> {
        let now = Utc::now();
        let variant = ContentVariant {
            variant_id: new_entity_id(),
            content_id,
            data: new.data,
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        };
        self.store.variant_insert(&variant).await?;
        self.invalidate_all().await;
        Ok(variant)
    }

    /// Make `variant_id` the content's single default.
    ///
    /// Existing assignments are untouched (sticky); only users with no prior
    /// assignment pick up the new default. The whole cache is cleared
    /// because any user's cached content row may now be stale.
    pub async fn set_default_variant(&self, content_id: Uuid, variant_id: Uuid) -> VaryResult<()> {
        self.store
            .set_default_variant(content_id, variant_id)
            .await?;
        self.invalidate_all().await;
        Ok(())
    }

    /// Delete a content, cascading to variants and assignments.
    /// Returns false when the content did not exist.
    pub async fn delete_content(&self, content_id: Uuid) -> VaryResult<bool> {
        let removed = self.store.content_delete(content_id).await?;
        if removed {
            self.invalidate_all().await;
        }
        Ok(removed)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// The content's current default variant.
    pub async fn get_default_variant(
        &self,
        content_id: Uuid,
    ) -> VaryResult<Option<ContentVariant>> {
        self.store.default_variant(content_id).await
    }

    /// The assignment binding this user to a variant of this content, if any.
    pub async fn get_assignment(
        &self,
        user_id: Uuid,
        content_id: Uuid,
    ) -> VaryResult<Option<VariantAssignment>> {
        self.store.assignment_get(user_id, content_id).await
    }

    /// A user's assignment history, most recently accessed first.
    pub async fn user_history(&self, user_id: Uuid) -> VaryResult<Vec<VariantAssignment>> {
        self.store.assignments_by_user(user_id).await
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    /// Clear the whole cache after a variant mutation. The affected key set
    /// is not enumerable in advance, so coarse invalidation is the only
    /// sound option. Cache failure never fails the mutation; short TTLs
    /// bound the staleness window.
    async fn invalidate_all(&self) {
        match self.cache.clear().await {
            Ok(removed) => {
                tracing::info!(removed, "cache cleared after variant mutation");
            }
            Err(e) => {
                tracing::error!(error = %e, "cache clear failed after variant mutation");
            }
        }
    }

    /// Classify a missing default: nonexistent content and variant-less
    /// content are normal absences; variants without a default are corrupted
    /// durable state and fail loudly.
    async fn missing_default(&self, content_id: Uuid) -> VaryError {
        match self.store.content_exists(content_id).await {
            Err(e) => e,
            Ok(false) => StorageError::NotFound {
                entity_type: EntityType::Content,
                id: content_id,
            }
            .into(),
            Ok(true) => match self.store.variant_count(content_id).await {
                Err(e) => e,
                Ok(0) => StorageError::NotFound {
                    entity_type: EntityType::Variant,
                    id: content_id,
                }
                .into(),
                Ok(_) => {
                    tracing::error!(%content_id, "content has variants but no default");
                    IntegrityError::NoDefaultVariant { content_id }.into()
                }
            },
        }
    }
}

fn dangling_assignment(assignment: &VariantAssignment) -> VaryError {
    tracing::error!(
        assignment_id = %assignment.assignment_id,
        variant_id = %assignment.variant_id,
        "assignment references a missing variant"
    );
    IntegrityError::DanglingAssignment {
        assignment_id: assignment.assignment_id,
        variant_id: assignment.variant_id,
    }
    .into()
}

impl<S, C> Clone for VariantEngine<S, C>
where
    S: VariantStore,
    C: Cache,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
