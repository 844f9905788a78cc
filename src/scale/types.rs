use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{self, ExpiryStatus};

/// Transport protocol a scale device listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
  #[default]
  Tcp,
  Udp,
}

impl std::fmt::Display for Protocol {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Protocol::Tcp => write!(f, "TCP"),
      Protocol::Udp => write!(f, "UDP"),
    }
  }
}

/// A registered scale device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
  pub id: u64,
  pub name: String,
  pub description: String,
  pub host: String,
  pub port: u16,
  pub protocol: Protocol,
  /// The server-side product cache has edits not yet pushed to the
  /// physical device.
  pub cached_dirty: bool,
  pub auto_update: AutoUpdate,
}

/// Auto-update configuration nested in a device record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoUpdate {
  pub enabled: bool,
  pub interval_minutes: u32,
  pub last_run_utc: Option<DateTime<Utc>>,
}

/// Auto-update settings as a standalone resource
/// (`GET/PUT /devices/{id}/auto-update`), keyed by device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoUpdateSettings {
  pub device_id: u64,
  pub enabled: bool,
  pub interval_minutes: u32,
  pub last_run_utc: Option<DateTime<Utc>>,
}

/// Input for creating or fully updating a device.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceDraft {
  pub name: String,
  pub description: String,
  pub host: String,
  pub port: u16,
  pub protocol: Protocol,
}

impl From<&Device> for DeviceDraft {
  fn from(device: &Device) -> Self {
    DeviceDraft {
      name: device.name.clone(),
      description: device.description.clone(),
      host: device.host.clone(),
      port: device.port,
      protocol: device.protocol,
    }
  }
}

/// A product in a device's server-side cache.
///
/// Dates are stored in their masked `DD-MM-YY` form and parsed on
/// demand; an empty string means no date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub plu: u32,
  pub name: String,
  pub price: f64,
  pub shelf_life_days: Option<u32>,
  pub manufacture_date: String,
  pub sell_by_date: String,
}

impl Product {
  pub fn sell_by(&self) -> Option<NaiveDate> {
    dates::parse(&self.sell_by_date)
  }

  /// Display status relative to `today` (a UTC calendar date).
  pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
    dates::expiry_status(self.sell_by(), today)
  }
}

/// Partial update for one cached product; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price: Option<f64>,
  #[serde(rename = "shelfLife", skip_serializing_if = "Option::is_none")]
  pub shelf_life_days: Option<u32>,
  #[serde(rename = "manufactureDate", skip_serializing_if = "Option::is_none")]
  pub manufacture_date: Option<String>,
  #[serde(rename = "sellByDate", skip_serializing_if = "Option::is_none")]
  pub sell_by_date: Option<String>,
}

impl ProductPatch {
  pub fn is_empty(&self) -> bool {
    *self == ProductPatch::default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn product(sell_by: &str) -> Product {
    Product {
      plu: 101,
      name: "Bananas".to_string(),
      price: 1.99,
      shelf_life_days: Some(5),
      manufacture_date: String::new(),
      sell_by_date: sell_by.to_string(),
    }
  }

  #[test]
  fn test_protocol_wire_form() {
    assert_eq!(serde_json::to_string(&Protocol::Tcp).unwrap(), r#""TCP""#);
    assert_eq!(
      serde_json::from_str::<Protocol>(r#""UDP""#).unwrap(),
      Protocol::Udp
    );
  }

  #[test]
  fn test_product_sell_by_parses_on_demand() {
    assert_eq!(
      product("01-01-26").sell_by(),
      NaiveDate::from_ymd_opt(2026, 1, 1)
    );
    assert_eq!(product("").sell_by(), None);
    assert_eq!(product("31-02-26").sell_by(), None);
  }

  #[test]
  fn test_product_patch_skips_unset_fields() {
    let patch = ProductPatch {
      price: Some(2.49),
      ..Default::default()
    };
    assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"price":2.49}"#);
    assert!(!patch.is_empty());
    assert!(ProductPatch::default().is_empty());
  }
}
