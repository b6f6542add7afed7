//! Cache layer with TTL expiry and coarse pattern invalidation.
//!
//! This module provides an expiring key-value cache plus bulk invalidation
//! primitives for callers that cannot enumerate the affected keys after a
//! mutation.
//!
//! # Design
//!
//! The cache is an optimization, never a correctness dependency: every
//! failure mode maps to [`vary_core::CacheError`], which callers are
//! expected to absorb by falling through to durable storage.
//!
//! A known-keys index is kept alongside the value store so that glob
//! patterns ([`KeyPattern`]) can be matched without scanning values. Both
//! structures live behind the same lock and stay consistent at every point
//! observable between operations; entries that expire are treated as absent
//! on the next `get` and pruned there.

pub mod memory;
pub mod pattern;
pub mod traits;

pub use memory::InMemoryCache;
pub use pattern::KeyPattern;
pub use traits::{Cache, CacheStats};
