//! Canonical cache keys and per-mutation invalidation groups.
//!
//! Four logical resources are cached client-side: the device list, a
//! single device, a device's cached product list, and a device's
//! auto-update settings. Every mutating API call maps to a fixed group
//! of keys that must be invalidated once the write succeeds, so that
//! list-level summaries (`cached_dirty`, product counts) never render
//! stale after a confirmed write.

use sha2::{Digest, Sha256};

/// A cache key for one logical remote resource.
///
/// Keys are canonical: the same resource always serializes to the same
/// key string. Device ids are numeric at the type level; textual ids
/// (e.g. command palette arguments) must be parsed before a key can be
/// constructed, so string/number mismatches cannot cause a key miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
  /// The device list.
  Devices,
  /// A single device record.
  Device { device_id: u64 },
  /// The server-side cached product list of one device.
  ProductsCached { device_id: u64 },
  /// Auto-update settings of one device.
  AutoUpdate { device_id: u64 },
}

impl CacheKey {
  /// Canonical string form of this key.
  pub fn canonical(&self) -> String {
    match self {
      CacheKey::Devices => "devices".to_string(),
      CacheKey::Device { device_id } => format!("device:{}", device_id),
      CacheKey::ProductsCached { device_id } => format!("products-cached:{}", device_id),
      CacheKey::AutoUpdate { device_id } => format!("auto-update:{}", device_id),
    }
  }

  /// Stable, fixed-length storage key (sha256 of the canonical form).
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// A mutating API operation, used to look up its invalidation group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
  CreateDevice,
  UpdateDevice { device_id: u64 },
  DeleteDevice { device_id: u64 },
  /// Fetch remote products into the server-side cache.
  FetchProducts { device_id: u64 },
  /// Push the server-side cache to the physical device.
  PushProducts { device_id: u64 },
  /// Patch one product's fields in the server-side cache.
  PatchProduct { device_id: u64 },
  UpdateAutoUpdate { device_id: u64 },
}

impl Mutation {
  /// The cache keys that must be invalidated after this mutation
  /// succeeds.
  ///
  /// Any mutation that can change a device's `cached_dirty` flag or its
  /// list-level summary invalidates both the narrow resource and the
  /// `device`/`devices` keys, since those summaries are derived from
  /// server state that changed as a side effect.
  pub fn invalidates(&self) -> Vec<CacheKey> {
    match *self {
      Mutation::CreateDevice => vec![CacheKey::Devices],
      Mutation::DeleteDevice { .. } => vec![CacheKey::Devices],
      Mutation::UpdateDevice { device_id } => {
        vec![CacheKey::Device { device_id }, CacheKey::Devices]
      }
      Mutation::FetchProducts { device_id }
      | Mutation::PushProducts { device_id }
      | Mutation::PatchProduct { device_id } => vec![
        CacheKey::ProductsCached { device_id },
        CacheKey::Device { device_id },
        CacheKey::Devices,
      ],
      Mutation::UpdateAutoUpdate { device_id } => vec![
        CacheKey::AutoUpdate { device_id },
        CacheKey::Device { device_id },
        CacheKey::Devices,
      ],
    }
  }

  /// Short description for logging.
  pub fn description(&self) -> &'static str {
    match self {
      Mutation::CreateDevice => "create device",
      Mutation::UpdateDevice { .. } => "update device",
      Mutation::DeleteDevice { .. } => "delete device",
      Mutation::FetchProducts { .. } => "fetch products",
      Mutation::PushProducts { .. } => "push products",
      Mutation::PatchProduct { .. } => "patch product",
      Mutation::UpdateAutoUpdate { .. } => "update auto-update settings",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_canonical_keys_are_stable() {
    assert_eq!(CacheKey::Devices.canonical(), "devices");
    assert_eq!(CacheKey::Device { device_id: 3 }.canonical(), "device:3");
    assert_eq!(
      CacheKey::ProductsCached { device_id: 3 }.canonical(),
      "products-cached:3"
    );
    assert_eq!(
      CacheKey::AutoUpdate { device_id: 3 }.canonical(),
      "auto-update:3"
    );
  }

  #[test]
  fn test_same_resource_same_hash() {
    assert_eq!(
      CacheKey::Device { device_id: 7 }.cache_hash(),
      CacheKey::Device { device_id: 7 }.cache_hash()
    );
  }

  #[test]
  fn test_distinct_resources_hash_distinctly() {
    let keys = [
      CacheKey::Devices,
      CacheKey::Device { device_id: 1 },
      CacheKey::Device { device_id: 2 },
      CacheKey::ProductsCached { device_id: 1 },
      CacheKey::AutoUpdate { device_id: 1 },
    ];
    for (i, a) in keys.iter().enumerate() {
      for b in &keys[i + 1..] {
        assert_ne!(a.cache_hash(), b.cache_hash(), "{:?} vs {:?}", a, b);
      }
    }
  }

  #[test]
  fn test_device_mutations_invalidate_list_only() {
    assert_eq!(Mutation::CreateDevice.invalidates(), vec![CacheKey::Devices]);
    assert_eq!(
      Mutation::DeleteDevice { device_id: 5 }.invalidates(),
      vec![CacheKey::Devices]
    );
  }

  #[test]
  fn test_product_mutations_invalidate_products_device_and_list() {
    let expected = vec![
      CacheKey::ProductsCached { device_id: 5 },
      CacheKey::Device { device_id: 5 },
      CacheKey::Devices,
    ];
    assert_eq!(Mutation::FetchProducts { device_id: 5 }.invalidates(), expected);
    assert_eq!(Mutation::PushProducts { device_id: 5 }.invalidates(), expected);
    assert_eq!(Mutation::PatchProduct { device_id: 5 }.invalidates(), expected);
  }

  #[test]
  fn test_auto_update_mutation_invalidates_settings_device_and_list() {
    assert_eq!(
      Mutation::UpdateAutoUpdate { device_id: 5 }.invalidates(),
      vec![
        CacheKey::AutoUpdate { device_id: 5 },
        CacheKey::Device { device_id: 5 },
        CacheKey::Devices,
      ]
    );
  }
}
