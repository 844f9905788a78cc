//! Caching implementations for scale domain types.

use crate::cache::Cacheable;

use super::types::{AutoUpdateSettings, Device, Product};

impl Cacheable for Device {
  fn cache_key(&self) -> String {
    self.id.to_string()
  }

  fn entity_type() -> &'static str {
    "device"
  }
}

impl Cacheable for Product {
  fn cache_key(&self) -> String {
    self.plu.to_string()
  }

  fn entity_type() -> &'static str {
    "product"
  }
}

impl Cacheable for AutoUpdateSettings {
  fn cache_key(&self) -> String {
    self.device_id.to_string()
  }

  fn entity_type() -> &'static str {
    "auto_update_settings"
  }
}
