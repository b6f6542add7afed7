//! VARY Engine - Stateful Variant Resolution
//!
//! Decides, deterministically and durably, which variant of a content a
//! given user sees, and keeps the cache layer consistent with that decision.
//!
//! # Guarantees
//!
//! - **Sticky assignment**: a user's first resolution for a content binds
//!   them to a variant; every later resolution returns the same variant,
//!   even across administrative default-variant changes.
//! - **Single default**: default switches are transactional in the store;
//!   no reader observes a content with zero or two defaults.
//! - **Cache never lies**: the cache accelerates payload construction only.
//!   Durable telemetry advances on every read, cache hit or not, and any
//!   variant mutation clears the whole cache because the affected key set is
//!   not enumerable in advance.

pub mod config;
pub mod engine;
pub mod keys;

pub use config::EngineConfig;
pub use engine::VariantEngine;
