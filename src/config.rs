use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scale::api_types::DEFAULT_PLU_FIELDS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub server: ServerConfig,
  /// Custom title for the header (defaults to the server domain).
  pub title: Option<String>,
  #[serde(default)]
  pub products: ProductsConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Base URL of the scale server, e.g. `http://localhost:8000`.
  pub url: String,
  /// Email prefilled in the login form.
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsConfig {
  /// Candidate product-key field names, in priority order. Overrides
  /// the built-in list when the server renames the field.
  #[serde(default = "default_plu_fields")]
  pub plu_fields: Vec<String>,
}

impl Default for ProductsConfig {
  fn default() -> Self {
    Self {
      plu_fields: default_plu_fields(),
    }
  }
}

fn default_plu_fields() -> Vec<String> {
  DEFAULT_PLU_FIELDS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before cached data is considered stale.
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
  /// Override the cache database location.
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: default_stale_secs(),
      path: None,
    }
  }
}

fn default_stale_secs() -> u64 {
  300
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./s9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/s9s/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/s9s/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("s9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("s9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config = Config::parse("server:\n  url: http://localhost:8000\n").unwrap();
    assert_eq!(config.server.url, "http://localhost:8000");
    assert_eq!(config.cache.stale_secs, 300);
    assert_eq!(config.products.plu_fields[0], "pluNumber");
  }

  #[test]
  fn test_parse_overrides() {
    let yaml = "\
server:
  url: http://scales.internal
  email: ops@example.com
title: deli fleet
products:
  plu_fields: [sku, plu]
cache:
  stale_secs: 30
";
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.server.email.as_deref(), Some("ops@example.com"));
    assert_eq!(config.title.as_deref(), Some("deli fleet"));
    assert_eq!(config.products.plu_fields, vec!["sku", "plu"]);
    assert_eq!(config.cache.stale_secs, 30);
  }

  #[test]
  fn test_parse_requires_server_url() {
    assert!(Config::parse("title: nope\n").is_err());
  }
}
