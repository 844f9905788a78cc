//! Serde-deserializable types matching the scale server's API responses.
//!
//! These types are separate from domain types to allow defensive
//! deserialization (missing fields default, unknown fields are kept in
//! a catch-all map) while keeping domain types focused on application
//! needs.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{AutoUpdate, AutoUpdateSettings, Device, Product, Protocol};

/// Candidate product-key field names, in priority order. Servers have
/// renamed this field more than once; keeping the list in one place
/// (and overridable from config) means the next rename is a one-line
/// change.
pub const DEFAULT_PLU_FIELDS: &[&str] = &[
  "pluNumber",
  "plu",
  "product_key",
  "productKey",
  "code",
  "id",
];

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  #[serde(default)]
  pub token_type: String,
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiAutoUpdate {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default)]
  pub interval_minutes: u32,
  #[serde(default)]
  pub last_run_utc: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiDevice {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default, alias = "ip")]
  pub host: String,
  #[serde(default)]
  pub port: u16,
  #[serde(default)]
  pub protocol: Protocol,
  #[serde(default)]
  pub cached_dirty: bool,
  #[serde(default)]
  pub auto_update: ApiAutoUpdate,
}

impl ApiDevice {
  pub fn into_device(self) -> Device {
    Device {
      id: self.id,
      name: self.name,
      description: self.description,
      host: self.host,
      port: self.port,
      protocol: self.protocol,
      cached_dirty: self.cached_dirty,
      auto_update: AutoUpdate {
        enabled: self.auto_update.enabled,
        interval_minutes: self.auto_update.interval_minutes,
        last_run_utc: self.auto_update.last_run_utc,
      },
    }
  }
}

impl ApiAutoUpdate {
  pub fn into_settings(self, device_id: u64) -> AutoUpdateSettings {
    AutoUpdateSettings {
      device_id,
      enabled: self.enabled,
      interval_minutes: self.interval_minutes,
      last_run_utc: self.last_run_utc,
    }
  }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiProduct {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub price: f64,
  /// Preferred shelf-life field.
  #[serde(default, rename = "shelfLife")]
  pub shelf_life: Option<f64>,
  /// Legacy shelf-life field, used when `shelfLife` is absent.
  #[serde(default, rename = "shelfLifeInDays")]
  pub shelf_life_in_days: Option<f64>,
  #[serde(default, rename = "manufactureDate", alias = "manufacture_date")]
  pub manufacture_date: String,
  #[serde(default, rename = "sellByDate", alias = "sell_by_date")]
  pub sell_by_date: String,
  /// Catch-all for the product-key field and anything else the server
  /// sends; see [`extract_plu`].
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl ApiProduct {
  /// Convert to the domain type. Returns `None` when no PLU can be
  /// extracted; such records cannot be addressed for editing and are
  /// skipped by the caller.
  pub fn into_product(self, plu_fields: &[String]) -> Option<Product> {
    let plu = extract_plu(&self.extra, plu_fields)?;
    let shelf_life_days = self
      .shelf_life
      .or(self.shelf_life_in_days)
      .and_then(|days| {
        if days.is_finite() && days >= 0.0 {
          Some(days.trunc() as u32)
        } else {
          None
        }
      });

    Some(Product {
      plu,
      name: self.name,
      price: self.price,
      shelf_life_days,
      manufacture_date: self.manufacture_date,
      sell_by_date: self.sell_by_date,
    })
  }
}

/// The cached-products endpoint wraps the list twice:
/// `{"products": {"products": [...]}}`.
#[derive(Debug, Deserialize)]
pub struct CachedProductsResponse {
  #[serde(default)]
  pub products: CachedProductsEnvelope,
}

#[derive(Debug, Deserialize, Default)]
pub struct CachedProductsEnvelope {
  #[serde(default)]
  pub products: Vec<ApiProduct>,
}

/// Extract the PLU from a raw product record.
///
/// Candidate field names are tried in order; the first present,
/// non-empty, numeric value wins. Numeric strings count (servers have
/// sent both `1234` and `"1234"` over the years); empty strings and
/// nulls do not.
pub fn extract_plu(fields: &Map<String, Value>, candidates: &[String]) -> Option<u32> {
  for name in candidates {
    match fields.get(name.as_str()) {
      Some(Value::Number(n)) => {
        if let Some(plu) = n.as_u64().and_then(|v| u32::try_from(v).ok()) {
          return Some(plu);
        }
      }
      Some(Value::String(s)) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          continue;
        }
        if let Ok(plu) = trimmed.parse::<u32>() {
          return Some(plu);
        }
      }
      _ => continue,
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plu_fields() -> Vec<String> {
    DEFAULT_PLU_FIELDS.iter().map(|s| s.to_string()).collect()
  }

  fn parse_product(json: &str) -> ApiProduct {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn test_plu_prefers_plu_number_over_all_others() {
    let product = parse_product(
      r#"{"pluNumber": 10, "plu": 20, "product_key": 30, "code": 40, "id": 50}"#,
    );
    assert_eq!(extract_plu(&product.extra, &plu_fields()), Some(10));
  }

  #[test]
  fn test_plu_first_non_empty_wins() {
    let product = parse_product(r#"{"pluNumber": "", "plu": null, "productKey": "77"}"#);
    assert_eq!(extract_plu(&product.extra, &plu_fields()), Some(77));
  }

  #[test]
  fn test_plu_numeric_string() {
    let product = parse_product(r#"{"plu": " 1234 "}"#);
    assert_eq!(extract_plu(&product.extra, &plu_fields()), Some(1234));
  }

  #[test]
  fn test_plu_missing_everywhere() {
    let product = parse_product(r#"{"name": "Bananas"}"#);
    assert_eq!(extract_plu(&product.extra, &plu_fields()), None);
    assert!(product.into_product(&plu_fields()).is_none());
  }

  #[test]
  fn test_shelf_life_preferred_over_legacy_field() {
    let product =
      parse_product(r#"{"plu": 1, "shelfLife": 7, "shelfLifeInDays": 99}"#);
    let product = product.into_product(&plu_fields()).unwrap();
    assert_eq!(product.shelf_life_days, Some(7));
  }

  #[test]
  fn test_shelf_life_falls_back_to_legacy_field() {
    let product = parse_product(r#"{"plu": 1, "shelfLifeInDays": 4}"#);
    let product = product.into_product(&plu_fields()).unwrap();
    assert_eq!(product.shelf_life_days, Some(4));
  }

  #[test]
  fn test_cached_products_double_envelope() {
    let body = r#"{"products": {"products": [
      {"pluNumber": 101, "name": "Bananas", "price": 1.99, "sellByDate": "01-01-26"}
    ]}}"#;
    let response: CachedProductsResponse = serde_json::from_str(body).unwrap();
    let products: Vec<_> = response
      .products
      .products
      .into_iter()
      .filter_map(|p| p.into_product(&plu_fields()))
      .collect();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].plu, 101);
    assert_eq!(products[0].sell_by_date, "01-01-26");
  }

  #[test]
  fn test_device_defaults_are_defensive() {
    let device: ApiDevice = serde_json::from_str(r#"{"id": 3, "name": "deli"}"#).unwrap();
    let device = device.into_device();
    assert_eq!(device.id, 3);
    assert_eq!(device.protocol, Protocol::Tcp);
    assert!(!device.cached_dirty);
    assert!(!device.auto_update.enabled);
  }

  #[test]
  fn test_device_host_alias_ip() {
    let device: ApiDevice =
      serde_json::from_str(r#"{"id": 1, "ip": "10.0.0.5", "port": 8080}"#).unwrap();
    assert_eq!(device.host, "10.0.0.5");
  }
}
