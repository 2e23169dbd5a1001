//! HTTP label catalog
//!
//! Talks to the label endpoints of the incident API over plain JSON:
//! - `GET {root}/labels/keys/` and `GET {root}/labels/id/{key}`
//! - `GET {root}/alertgroups/labels/keys/` and `GET {root}/alertgroups/labels/id/{key}`

use super::{CatalogClient, CatalogMode};
use crate::error::CatalogError;
use crate::model::{KeyValues, LabelKey};
use async_trait::async_trait;
use labelfilter_ids::KeyId;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Catalog backed by the label HTTP API for one [`CatalogMode`].
pub struct HttpCatalog {
    mode: CatalogMode,
    base_url: Url,
    http_client: reqwest::Client,
    name: String,
}

impl HttpCatalog {
    /// Create a catalog rooted at `base_url` (e.g. `https://host/api/internal/v1/`).
    pub fn new(base_url: &str, mode: CatalogMode, timeout: Duration) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(format!(
                "{}: cannot be used as an API root",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            mode,
            name: format!("http:{}", mode),
            base_url: parsed,
            http_client,
        })
    }

    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    pub fn keys_url(&self) -> Result<Url, CatalogError> {
        self.endpoint(self.mode.keys_segments().iter().copied())
    }

    pub fn values_url(&self, key_id: &KeyId) -> Result<Url, CatalogError> {
        let segments = self
            .mode
            .values_prefix_segments()
            .iter()
            .copied()
            .chain(std::iter::once(key_id.as_str()));
        self.endpoint(segments)
    }

    fn endpoint<'a>(&self, segments: impl Iterator<Item = &'a str>) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        tracing::debug!(catalog = %self.name, %url, "Catalog request");

        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_keys(&self) -> Result<Vec<LabelKey>, CatalogError> {
        let url = self.keys_url()?;
        self.get_json(url).await
    }

    async fn load_values_for_key(&self, key_id: &KeyId) -> Result<KeyValues, CatalogError> {
        let url = self.values_url(key_id)?;
        self.get_json(url).await
    }
}
