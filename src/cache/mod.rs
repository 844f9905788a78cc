//! Client-side cache consistency layer.
//!
//! This module defines the canonical cache keys for the four logical
//! remote resources, the invalidation group each mutation must fire,
//! a read-through keyed cache over SQLite storage, and the generation
//! map that lets live queries observe completed invalidations.

mod invalidation;
mod keys;
mod layer;
mod storage;
mod traits;

pub use invalidation::Invalidations;
pub use keys::{CacheKey, Mutation};
pub use layer::CacheLayer;
pub use storage::{CacheStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource, Cacheable};
