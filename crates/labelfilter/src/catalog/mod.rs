//! Catalog client abstraction.
//!
//! A catalog answers two questions: which label keys exist, and which values
//! exist for a given key. The filter never fetches a single key on its own;
//! keys come from the listing and values come from per-key lookups.
//!
//! Which catalog backs a filter is decided once, by [`CatalogMode`], through a
//! [`CatalogRegistry`].

pub mod http;
pub mod memory;

use crate::error::CatalogError;
use crate::model::{KeyValues, LabelKey};
use async_trait::async_trait;
use labelfilter_ids::KeyId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use http::HttpCatalog;
pub use memory::{CatalogFixture, FixtureKey, MemoryCatalog};

/// Capability interface over a label catalog backend.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Name of the backend, used in logs
    fn name(&self) -> &str;

    /// List every known label key.
    async fn load_keys(&self) -> Result<Vec<LabelKey>, CatalogError>;

    /// List every known value for `key_id`, together with the key itself.
    async fn load_values_for_key(&self, key_id: &KeyId) -> Result<KeyValues, CatalogError>;
}

/// Which label catalog a filter draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// Labels attached to integrations and other resources
    #[default]
    Labels,
    /// Labels attached to alert groups
    AlertGroupLabels,
}

impl CatalogMode {
    pub const ALL: [CatalogMode; 2] = [CatalogMode::Labels, CatalogMode::AlertGroupLabels];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogMode::Labels => "labels",
            CatalogMode::AlertGroupLabels => "alert_group_labels",
        }
    }

    /// Path segments of the key listing endpoint, relative to the API root.
    pub(crate) fn keys_segments(&self) -> &'static [&'static str] {
        match self {
            CatalogMode::Labels => &["labels", "keys", ""],
            CatalogMode::AlertGroupLabels => &["alertgroups", "labels", "keys", ""],
        }
    }

    /// Path segments preceding the key id in the value lookup endpoint.
    pub(crate) fn values_prefix_segments(&self) -> &'static [&'static str] {
        match self {
            CatalogMode::Labels => &["labels", "id"],
            CatalogMode::AlertGroupLabels => &["alertgroups", "labels", "id"],
        }
    }
}

impl fmt::Display for CatalogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CatalogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "labels" => Ok(CatalogMode::Labels),
            "alert_group_labels" => Ok(CatalogMode::AlertGroupLabels),
            other => Err(format!(
                "unknown catalog mode '{}' (expected 'labels' or 'alert_group_labels')",
                other
            )),
        }
    }
}

/// Catalog clients keyed by mode.
#[derive(Clone, Default)]
pub struct CatalogRegistry {
    clients: HashMap<CatalogMode, Arc<dyn CatalogClient>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the client serving `mode`, replacing any previous one.
    pub fn register(&mut self, mode: CatalogMode, client: Arc<dyn CatalogClient>) {
        self.clients.insert(mode, client);
    }

    pub fn with_client(mut self, mode: CatalogMode, client: Arc<dyn CatalogClient>) -> Self {
        self.register(mode, client);
        self
    }

    pub fn client_for(&self, mode: CatalogMode) -> Result<Arc<dyn CatalogClient>, CatalogError> {
        self.clients
            .get(&mode)
            .cloned()
            .ok_or(CatalogError::ModeNotConfigured(mode))
    }

    pub fn modes(&self) -> impl Iterator<Item = CatalogMode> + '_ {
        CatalogMode::ALL
            .into_iter()
            .filter(|mode| self.clients.contains_key(mode))
    }
}

impl fmt::Debug for CatalogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for mode in self.modes() {
            if let Some(client) = self.clients.get(&mode) {
                map.entry(&mode, &client.name());
            }
        }
        map.finish()
    }
}
