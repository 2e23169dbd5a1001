//! Command implementations. Each returns the rendered output.

use crate::output;
use anyhow::{Context, Result};
use labelfilter::config::{default_config_path, load_config};
use labelfilter::{
    CatalogConfig, CatalogMode, FilterProps, LabelFilterConfig, LabelsFilter, Selector,
};
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub mode: Option<CatalogMode>,
    pub base_url: Option<String>,
    pub fixture: Option<PathBuf>,
}

/// Effective settings after merging config file and overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogConfig,
    pub auto_focus: bool,
}

impl Settings {
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => match default_config_path() {
                Ok(path) => load_config(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?,
                Err(err) => {
                    tracing::debug!(error = %err, "No default config location; using defaults");
                    LabelFilterConfig::default()
                }
            },
        };
        Ok(Self::merge(config, overrides))
    }

    fn merge(config: LabelFilterConfig, overrides: Overrides) -> Self {
        let mut catalog = config.catalog;
        if let Some(mode) = overrides.mode {
            catalog.mode = mode;
        }
        if let Some(base_url) = overrides.base_url {
            catalog.base_url = base_url;
            // An explicit URL means HTTP, even if the file names a fixture.
            catalog.fixture = None;
        }
        if let Some(fixture) = overrides.fixture {
            catalog.fixture = Some(fixture);
        }
        Self {
            catalog,
            auto_focus: config.filter.auto_focus,
        }
    }
}

/// Build and mount a filter for the configured mode.
async fn mounted_filter(settings: &Settings, value: Vec<Selector>) -> Result<LabelsFilter> {
    let registry = settings
        .catalog
        .build_registry()
        .context("Failed to set up label catalog")?;

    let filter = LabelsFilter::new(
        FilterProps {
            filter_type: settings.catalog.mode,
            auto_focus: settings.auto_focus,
            value,
        },
        &registry,
        |_| {},
    )?;
    tracing::info!(filter = ?filter, "Mounting label filter");

    filter
        .mount()
        .await
        .with_context(|| format!("Failed to load labels from {}", filter.catalog_name()))?;
    Ok(filter)
}

pub async fn keys(settings: &Settings, json: bool) -> Result<String> {
    let filter = mounted_filter(settings, Vec::new()).await?;
    let keys: Vec<_> = filter.keys().iter().cloned().collect();
    output::keys(&keys, json)
}

pub async fn resolve(settings: &Settings, raw: &[String], json: bool) -> Result<String> {
    let selectors: Vec<Selector> = raw.iter().map(|s| Selector::parse(s)).collect();
    let filter = mounted_filter(settings, selectors.clone()).await?;
    output::resolved(&selectors, &filter.value(), json)
}

pub async fn search(settings: &Settings, query: &str, json: bool) -> Result<String> {
    let filter = mounted_filter(settings, Vec::new()).await?;
    let options = filter
        .load_options(Some(query))
        .await
        .with_context(|| format!("Search for '{}' failed", query))?;
    output::options(&options, json)
}
