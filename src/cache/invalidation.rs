//! Generation counters that let live queries observe invalidations.
//!
//! Each [`CacheKey`] maps to a monotonically increasing generation.
//! A `Query` bound to a key records the generation at fetch time; when
//! an invalidation group bumps the key, the query sees a newer
//! generation on its next poll and re-fetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::keys::CacheKey;

/// Shared per-key invalidation generations.
#[derive(Debug, Clone, Default)]
pub struct Invalidations {
  generations: Arc<Mutex<HashMap<CacheKey, u64>>>,
}

impl Invalidations {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bump the generation of every key in the group.
  pub fn bump(&self, keys: &[CacheKey]) {
    if let Ok(mut generations) = self.generations.lock() {
      for key in keys {
        *generations.entry(*key).or_insert(0) += 1;
      }
    }
  }

  /// Current generation of a key (0 if it has never been invalidated).
  pub fn generation(&self, key: &CacheKey) -> u64 {
    self
      .generations
      .lock()
      .ok()
      .and_then(|generations| generations.get(key).copied())
      .unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unknown_key_has_generation_zero() {
    let inv = Invalidations::new();
    assert_eq!(inv.generation(&CacheKey::Devices), 0);
  }

  #[test]
  fn test_bump_raises_every_key_in_group() {
    let inv = Invalidations::new();
    let group = [
      CacheKey::ProductsCached { device_id: 1 },
      CacheKey::Device { device_id: 1 },
      CacheKey::Devices,
    ];

    inv.bump(&group);
    for key in &group {
      assert_eq!(inv.generation(key), 1, "{:?}", key);
    }

    inv.bump(&group);
    assert_eq!(inv.generation(&CacheKey::Devices), 2);
  }

  #[test]
  fn test_bump_leaves_unrelated_keys_alone() {
    let inv = Invalidations::new();
    inv.bump(&[CacheKey::Devices]);
    assert_eq!(inv.generation(&CacheKey::Device { device_id: 1 }), 0);
    assert_eq!(inv.generation(&CacheKey::AutoUpdate { device_id: 1 }), 0);
  }
}
