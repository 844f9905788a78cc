//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity (e.g. device id, product PLU).
  fn cache_key(&self) -> String;

  /// Entity type name for storage organization (e.g. "device", "product").
  fn entity_type() -> &'static str;
}

/// Result from a cache operation, including data and metadata about the
/// source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data.
  pub data: T,
  /// Where the data came from.
  pub source: CacheSource,
  /// When the data was cached (if from cache).
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Data served from cache.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  /// Stale data served because the network is unavailable.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network.
  Network,
  /// Data from cache, within the stale window.
  Cache,
  /// Network unavailable, serving stale cached data.
  Offline,
}
