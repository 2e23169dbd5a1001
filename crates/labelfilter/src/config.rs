//! Label filter configuration
//!
//! Reads settings from `~/.labelfilter/config.toml`:
//!
//! ```toml
//! [catalog]
//! mode = "labels"
//! base_url = "http://localhost:8080/api/internal/v1/"
//! request_timeout_seconds = 30
//! # fixture = "catalog.json"
//!
//! [filter]
//! auto_focus = false
//! ```

use crate::catalog::{CatalogClient, CatalogFixture, CatalogMode, CatalogRegistry, HttpCatalog};
use crate::error::{CatalogError, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of config.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelFilterConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub filter: FilterSettings,
}

/// Where label keys and values come from
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Catalog the filter uses: "labels" or "alert_group_labels"
    #[serde(default)]
    pub mode: CatalogMode,

    /// API root of the label endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Serve the catalog from a JSON fixture instead of HTTP
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mode: CatalogMode::default(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            fixture: None,
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build a client for every mode this config can serve.
    ///
    /// With a fixture, only the modes the fixture defines are registered; a
    /// fixture that defines none is an error.
    /// Otherwise both modes go to the HTTP API at `base_url`.
    pub fn build_registry(&self) -> std::result::Result<CatalogRegistry, CatalogError> {
        let mut registry = CatalogRegistry::new();

        if let Some(path) = &self.fixture {
            let fixture = CatalogFixture::from_file(path)?;
            for mode in fixture.modes() {
                if let Some(catalog) = fixture.catalog_for(mode) {
                    registry.register(mode, Arc::new(catalog));
                }
            }
            return Ok(registry);
        }

        for mode in CatalogMode::ALL {
            let client: Arc<dyn CatalogClient> =
                Arc::new(HttpCatalog::new(&self.base_url, mode, self.request_timeout())?);
            registry.register(mode, client);
        }
        Ok(registry)
    }
}

/// Behavior forwarded to the rendering widget
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    /// Focus the picker as soon as it renders
    #[serde(default)]
    pub auto_focus: bool,
}

fn default_base_url() -> String { "http://localhost:8080/api/internal/v1/".to_string() }
fn default_request_timeout() -> u64 { 30 }

/// Load configuration from a file; a missing file yields defaults.
pub fn load_config(config_path: &Path) -> Result<LabelFilterConfig> {
    if !config_path.exists() {
        return Ok(LabelFilterConfig::default());
    }

    let content = std::fs::read_to_string(config_path)?;
    let config: LabelFilterConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Default config location: ~/.labelfilter/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::NotFound("Could not find home directory".to_string())
    })?;
    Ok(home.join(".labelfilter").join("config.toml"))
}

/// Load configuration from the default location
pub fn load_default_config() -> Result<LabelFilterConfig> {
    load_config(&default_config_path()?)
}
