use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;

use super::api_types::{ApiAutoUpdate, ApiDevice, CachedProductsResponse, TokenResponse};
use super::error::{flatten_detail, ApiError};
use super::session::Session;
use super::types::{AutoUpdateSettings, Device, DeviceDraft, Product, ProductPatch};

/// Typed client for the scale server's HTTP API.
///
/// Every request reads the bearer token from the shared [`Session`];
/// a 401 from any endpoint clears it before the error is returned.
#[derive(Clone)]
pub struct ScaleClient {
  http: reqwest::Client,
  base_url: String,
  session: Session,
  plu_fields: Arc<Vec<String>>,
}

impl ScaleClient {
  pub fn new(config: &Config, session: Session) -> color_eyre::Result<Self> {
    // Fail early on an unparseable server URL instead of on first use.
    url::Url::parse(&config.server.url)
      .map_err(|e| color_eyre::eyre::eyre!("Invalid server URL {}: {}", config.server.url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base_url: config.server.url.trim_end_matches('/').to_string(),
      session,
      plu_fields: Arc::new(config.products.plu_fields.clone()),
    })
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Attach the bearer token, send, and map the response status onto
  /// the error taxonomy.
  async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let request = match self.session.token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    };

    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
      warn!("received 401, clearing session");
      self.session.clear();
      return Err(ApiError::Unauthorized);
    }

    if status == StatusCode::UNPROCESSABLE_ENTITY {
      let body = response.text().await.unwrap_or_default();
      return Err(ApiError::Validation(flatten_detail(&body)));
    }

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ApiError::Server {
        status: status.as_u16(),
        message: flatten_detail(&body),
      });
    }

    Ok(response)
  }

  async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    response
      .json()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()))
  }

  // ==========================================================================
  // Auth
  // ==========================================================================

  pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
    let request = self
      .http
      .post(self.endpoint("/auth/register"))
      .json(&serde_json::json!({ "email": email, "password": password }));

    self.send(request).await?;
    Ok(())
  }

  /// Log in and store the access token in the session.
  pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
    // The login endpoint is form-encoded, unlike the rest of the API.
    let request = self
      .http
      .post(self.endpoint("/auth/login"))
      .form(&[("username", email), ("password", password)]);

    let response = self.send(request).await?;
    let token: TokenResponse = Self::decode(response).await?;
    self.session.set(token.access_token);
    Ok(())
  }

  // ==========================================================================
  // Devices
  // ==========================================================================

  pub async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
    let response = self.send(self.http.get(self.endpoint("/devices"))).await?;
    let devices: Vec<ApiDevice> = Self::decode(response).await?;
    Ok(devices.into_iter().map(ApiDevice::into_device).collect())
  }

  pub async fn get_device(&self, device_id: u64) -> Result<Device, ApiError> {
    let response = self
      .send(self.http.get(self.endpoint(&format!("/devices/{}", device_id))))
      .await?;
    let device: ApiDevice = Self::decode(response).await?;
    Ok(device.into_device())
  }

  pub async fn create_device(&self, draft: &DeviceDraft) -> Result<Device, ApiError> {
    let request = self.http.post(self.endpoint("/devices")).json(draft);
    let response = self.send(request).await?;
    let device: ApiDevice = Self::decode(response).await?;
    Ok(device.into_device())
  }

  pub async fn update_device(&self, device_id: u64, draft: &DeviceDraft) -> Result<Device, ApiError> {
    let request = self
      .http
      .put(self.endpoint(&format!("/devices/{}", device_id)))
      .json(draft);
    let response = self.send(request).await?;
    let device: ApiDevice = Self::decode(response).await?;
    Ok(device.into_device())
  }

  pub async fn delete_device(&self, device_id: u64) -> Result<(), ApiError> {
    self
      .send(
        self
          .http
          .delete(self.endpoint(&format!("/devices/{}", device_id))),
      )
      .await?;
    Ok(())
  }

  // ==========================================================================
  // Products
  // ==========================================================================

  /// Ask the server to fetch the device's remote catalog into its
  /// cache. The refreshed list is read back separately via
  /// [`ScaleClient::cached_products`].
  pub async fn fetch_products(&self, device_id: u64) -> Result<(), ApiError> {
    self
      .send(
        self
          .http
          .get(self.endpoint(&format!("/devices/{}/products", device_id))),
      )
      .await?;
    Ok(())
  }

  pub async fn cached_products(&self, device_id: u64) -> Result<Vec<Product>, ApiError> {
    let response = self
      .send(
        self
          .http
          .get(self.endpoint(&format!("/devices/{}/products/cached", device_id))),
      )
      .await?;
    let body: CachedProductsResponse = Self::decode(response).await?;

    let mut products = Vec::new();
    for raw in body.products.products {
      match raw.into_product(&self.plu_fields) {
        Some(product) => products.push(product),
        None => warn!("skipping cached product without a usable PLU"),
      }
    }
    Ok(products)
  }

  pub async fn patch_product(
    &self,
    device_id: u64,
    plu: u32,
    patch: &ProductPatch,
  ) -> Result<(), ApiError> {
    let request = self
      .http
      .patch(self.endpoint(&format!("/devices/{}/products/{}", device_id, plu)))
      .json(patch);
    self.send(request).await?;
    Ok(())
  }

  /// Push the server-side product cache to the physical device.
  pub async fn upload(&self, device_id: u64) -> Result<(), ApiError> {
    self
      .send(
        self
          .http
          .post(self.endpoint(&format!("/devices/{}/upload", device_id))),
      )
      .await?;
    Ok(())
  }

  // ==========================================================================
  // Auto-update
  // ==========================================================================

  pub async fn auto_update(&self, device_id: u64) -> Result<AutoUpdateSettings, ApiError> {
    let response = self
      .send(
        self
          .http
          .get(self.endpoint(&format!("/devices/{}/auto-update", device_id))),
      )
      .await?;
    let settings: ApiAutoUpdate = Self::decode(response).await?;
    Ok(settings.into_settings(device_id))
  }

  pub async fn set_auto_update(
    &self,
    device_id: u64,
    enabled: bool,
    interval_minutes: u32,
  ) -> Result<(), ApiError> {
    let request = self
      .http
      .put(self.endpoint(&format!("/devices/{}/auto-update", device_id)))
      .json(&serde_json::json!({
        "enabled": enabled,
        "interval_minutes": interval_minutes,
      }));
    self.send(request).await?;
    Ok(())
  }
}
