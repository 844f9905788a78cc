//! Cache layer that orchestrates read-through caching with network
//! fetching and key-based invalidation.

use chrono::{Duration, Utc};
use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;

use super::storage::CacheStorage;
use super::traits::{CacheResult, Cacheable};

/// Read-through cache between the application and the network client.
///
/// Reads within the stale window are served from storage; stale or
/// missing entries are fetched from the network, with the stale copy as
/// an offline fallback. Mutating code never updates entries in place;
/// operations call [`CacheLayer::invalidate_query`] /
/// [`CacheLayer::invalidate_entity`] so the next read re-fetches.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long before cached data is considered stale.
  stale_time: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      stale_time: Duration::minutes(5),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If stale/missing, fetch from network
  /// 3. On network failure, return stale cache (offline mode)
  /// 4. Update cache with new data
  pub async fn fetch_list<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    if let Some(cached) = self.storage.get_query_result::<T>(key)? {
      if !self.is_stale(cached.cached_at) {
        return Ok(CacheResult::from_cache(cached.entities, cached.cached_at));
      }

      match fetcher().await {
        Ok(data) => {
          self.storage.store_query_result(key, &data)?;
          Ok(CacheResult::from_network(data))
        }
        Err(_) => Ok(CacheResult::offline(cached.entities, cached.cached_at)),
      }
    } else {
      let data = fetcher().await?;
      self.storage.store_query_result(key, &data)?;
      Ok(CacheResult::from_network(data))
    }
  }

  /// Fetch a single entity with caching.
  pub async fn fetch_one<T, F, Fut>(&self, entity_key: &str, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if let Some(cached) = self.storage.get_entity::<T>(entity_key)? {
      if !self.is_stale(cached.cached_at) {
        return Ok(CacheResult::from_cache(cached.entity, cached.cached_at));
      }

      match fetcher().await {
        Ok(data) => {
          self.storage.store_entity(&data)?;
          Ok(CacheResult::from_network(data))
        }
        Err(_) => Ok(CacheResult::offline(cached.entity, cached.cached_at)),
      }
    } else {
      let data = fetcher().await?;
      self.storage.store_entity(&data)?;
      Ok(CacheResult::from_network(data))
    }
  }

  /// Remove a stored query result so the next read re-fetches.
  pub fn invalidate_query(&self, key: &str) -> Result<()> {
    self.storage.remove_query(key)
  }

  /// Remove a stored entity so the next read re-fetches.
  pub fn invalidate_entity(&self, entity_type: &str, entity_key: &str) -> Result<()> {
    self.storage.remove_entity(entity_type, entity_key)
  }

  /// Drop all cached state (used when the session ends).
  pub fn clear(&self) -> Result<()> {
    self.storage.clear()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      stale_time: self.stale_time,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, SqliteStorage};
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc as StdArc;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: u32,
    label: String,
  }

  impl Cacheable for Item {
    fn cache_key(&self) -> String {
      self.id.to_string()
    }

    fn entity_type() -> &'static str {
      "test_item"
    }
  }

  fn item(id: u32, label: &str) -> Item {
    Item {
      id,
      label: label.to_string(),
    }
  }

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(SqliteStorage::open_in_memory().unwrap())
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_fetcher() {
    let cache = layer();
    let calls = StdArc::new(AtomicU32::new(0));

    for _ in 0..2 {
      let calls = calls.clone();
      let result = cache
        .fetch_list("k", move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![item(1, "a")])
        })
        .await
        .unwrap();
      assert_eq!(result.data, vec![item(1, "a")]);
    }

    // Second read was served from cache.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidated_query_refetches() {
    let cache = layer();
    let calls = StdArc::new(AtomicU32::new(0));

    let fetch = |label: &'static str| {
      let calls = calls.clone();
      let cache = cache.clone();
      async move {
        cache
          .fetch_list("k", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![item(1, label)])
          })
          .await
          .unwrap()
      }
    };

    assert_eq!(fetch("before").await.data[0].label, "before");
    cache.invalidate_query("k").unwrap();

    // No stale entry survives a completed invalidation: the next read
    // runs the fetcher again and returns the updated data.
    let result = fetch("after").await;
    assert_eq!(result.data[0].label, "after");
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidated_entity_refetches() {
    let cache = layer();

    cache
      .fetch_one("1", || async { Ok(item(1, "before")) })
      .await
      .unwrap();
    cache.invalidate_entity(Item::entity_type(), "1").unwrap();

    let result = cache
      .fetch_one("1", || async { Ok(item(1, "after")) })
      .await
      .unwrap();
    assert_eq!(result.data.label, "after");
  }

  #[tokio::test]
  async fn test_offline_fallback_serves_stale_copy() {
    let cache = layer().with_stale_time(Duration::zero());

    cache
      .fetch_list("k", || async { Ok(vec![item(1, "cached")]) })
      .await
      .unwrap();

    // Everything is instantly stale; a failing fetcher falls back.
    let result = cache
      .fetch_list::<Item, _, _>("k", || async { Err(color_eyre::eyre::eyre!("offline")) })
      .await
      .unwrap();
    assert_eq!(result.data[0].label, "cached");
    assert_eq!(result.source, CacheSource::Offline);
  }

  #[tokio::test]
  async fn test_clear_drops_everything() {
    let cache = layer();
    let calls = StdArc::new(AtomicU32::new(0));

    cache
      .fetch_list("k", || async { Ok(vec![item(1, "a")]) })
      .await
      .unwrap();
    cache
      .fetch_one("1", || async { Ok(item(1, "a")) })
      .await
      .unwrap();

    cache.clear().unwrap();

    let calls2 = calls.clone();
    cache
      .fetch_list("k", move || async move {
        calls2.fetch_add(1, Ordering::SeqCst);
        Ok(vec![item(1, "a")])
      })
      .await
      .unwrap();
    let calls3 = calls.clone();
    cache
      .fetch_one("1", move || async move {
        calls3.fetch_add(1, Ordering::SeqCst);
        Ok(item(1, "a"))
      })
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
