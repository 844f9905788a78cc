//! Cached scale client that ties reads to cache keys and mutations to
//! invalidation groups.
//!
//! Reads go through the read-through [`CacheLayer`] under the canonical
//! key of their resource. Every mutation method runs the remote call
//! and then completes its whole invalidation group (stored rows are
//! removed and generations bumped) before returning, so callers can
//! surface a success notification knowing the next render re-fetches
//! fresh state.

use color_eyre::{eyre::eyre, Result};
use tracing::info;

use crate::cache::{CacheKey, CacheLayer, Cacheable, Invalidations, Mutation, SqliteStorage};
use crate::config::Config;
use crate::dates;

use super::client::ScaleClient;
use super::error::ApiError;
use super::session::Session;
use super::types::{AutoUpdateSettings, Device, DeviceDraft, Product, ProductPatch};

/// Fallback auto-update interval when the entered value is unusable.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

#[derive(Clone)]
pub struct CachedScaleClient {
  inner: ScaleClient,
  cache: CacheLayer<SqliteStorage>,
  invalidations: Invalidations,
}

impl CachedScaleClient {
  pub fn new(config: &Config, session: Session) -> Result<Self> {
    let inner = ScaleClient::new(config, session)?;
    let storage = match &config.cache.path {
      Some(path) => SqliteStorage::open_at(path)?,
      None => SqliteStorage::open()?,
    };
    let cache = CacheLayer::new(storage)
      .with_stale_time(chrono::Duration::seconds(config.cache.stale_secs as i64));

    Ok(Self {
      inner,
      cache,
      invalidations: Invalidations::new(),
    })
  }

  /// Generation map shared with queries bound to cache keys.
  pub fn invalidations(&self) -> Invalidations {
    self.invalidations.clone()
  }

  pub fn session(&self) -> &Session {
    self.inner.session()
  }

  pub fn base_url(&self) -> &str {
    self.inner.base_url()
  }

  /// Drop all cached query state (unauthenticated transition, logout).
  pub fn clear_cache(&self) -> Result<()> {
    self.cache.clear()
  }

  /// Complete a mutation's invalidation group: remove stored rows, then
  /// bump generations so bound queries re-fetch.
  fn invalidate(&self, mutation: Mutation) -> Result<(), ApiError> {
    let keys = mutation.invalidates();
    for key in &keys {
      let removed = match key {
        CacheKey::Devices | CacheKey::ProductsCached { .. } => {
          self.cache.invalidate_query(&key.cache_hash())
        }
        CacheKey::Device { device_id } => self
          .cache
          .invalidate_entity(Device::entity_type(), &device_id.to_string()),
        CacheKey::AutoUpdate { device_id } => self
          .cache
          .invalidate_entity(AutoUpdateSettings::entity_type(), &device_id.to_string()),
      };
      removed.map_err(|e| ApiError::Cache(e.to_string()))?;
    }
    self.invalidations.bump(&keys);
    info!(mutation = mutation.description(), keys = keys.len(), "invalidated");
    Ok(())
  }

  // ==========================================================================
  // Auth (no cached state involved)
  // ==========================================================================

  pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
    self.inner.register(email, password).await
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
    self.inner.login(email, password).await
  }

  pub fn logout(&self) -> Result<()> {
    self.session().clear();
    self.clear_cache()
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  pub async fn list_devices(&self) -> Result<Vec<Device>> {
    let key = CacheKey::Devices.cache_hash();
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch_list(&key, || async move {
        inner.list_devices().await.map_err(|e| eyre!("{}", e))
      })
      .await?;
    Ok(result.data)
  }

  pub async fn get_device(&self, device_id: u64) -> Result<Device> {
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch_one(&device_id.to_string(), || async move {
        inner.get_device(device_id).await.map_err(|e| eyre!("{}", e))
      })
      .await?;
    Ok(result.data)
  }

  pub async fn cached_products(&self, device_id: u64) -> Result<Vec<Product>> {
    let key = CacheKey::ProductsCached { device_id }.cache_hash();
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch_list(&key, || async move {
        inner
          .cached_products(device_id)
          .await
          .map_err(|e| eyre!("{}", e))
      })
      .await?;
    Ok(result.data)
  }

  pub async fn auto_update(&self, device_id: u64) -> Result<AutoUpdateSettings> {
    let inner = self.inner.clone();
    let result = self
      .cache
      .fetch_one(&device_id.to_string(), || async move {
        inner.auto_update(device_id).await.map_err(|e| eyre!("{}", e))
      })
      .await?;
    Ok(result.data)
  }

  // ==========================================================================
  // Mutations
  // ==========================================================================

  pub async fn create_device(&self, draft: &DeviceDraft) -> Result<Device, ApiError> {
    let device = self.inner.create_device(draft).await?;
    self.invalidate(Mutation::CreateDevice)?;
    Ok(device)
  }

  pub async fn update_device(&self, device_id: u64, draft: &DeviceDraft) -> Result<Device, ApiError> {
    let device = self.inner.update_device(device_id, draft).await?;
    self.invalidate(Mutation::UpdateDevice { device_id })?;
    Ok(device)
  }

  pub async fn delete_device(&self, device_id: u64) -> Result<(), ApiError> {
    self.inner.delete_device(device_id).await?;
    self.invalidate(Mutation::DeleteDevice { device_id })
  }

  /// Fetch the device's remote catalog into the server-side cache.
  pub async fn fetch_products(&self, device_id: u64) -> Result<(), ApiError> {
    self.inner.fetch_products(device_id).await?;
    self.invalidate(Mutation::FetchProducts { device_id })
  }

  /// Push the server-side product cache to the physical device.
  pub async fn push_products(&self, device_id: u64) -> Result<(), ApiError> {
    self.inner.upload(device_id).await?;
    self.invalidate(Mutation::PushProducts { device_id })
  }

  pub async fn patch_product(
    &self,
    device_id: u64,
    plu: u32,
    patch: &ProductPatch,
  ) -> Result<(), ApiError> {
    self.inner.patch_product(device_id, plu, patch).await?;
    self.invalidate(Mutation::PatchProduct { device_id })
  }

  /// Write auto-update settings, sanitizing the interval first: the
  /// remote API rejects non-integer or non-positive values.
  pub async fn set_auto_update(
    &self,
    device_id: u64,
    enabled: bool,
    interval_minutes: f64,
  ) -> Result<(), ApiError> {
    let interval = dates::normalize_interval_minutes(interval_minutes, DEFAULT_INTERVAL_MINUTES);
    self.inner.set_auto_update(device_id, enabled, interval).await?;
    self.invalidate(Mutation::UpdateAutoUpdate { device_id })
  }
}
