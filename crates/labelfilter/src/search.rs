//! Option search for the label picker.

use crate::catalog::CatalogClient;
use crate::error::CatalogError;
use crate::keys::KeyCache;
use crate::model::{LabelKey, SelectableOption};
use futures::future::try_join_all;
use std::sync::Arc;

/// Produces `key:value` options for a free-text query.
#[derive(Clone)]
pub struct SearchEngine {
    catalog: Arc<dyn CatalogClient>,
    keys: KeyCache,
}

impl SearchEngine {
    pub fn new(catalog: Arc<dyn CatalogClient>, keys: KeyCache) -> Self {
        Self { catalog, keys }
    }

    /// Options for every value of every key whose name contains `query`.
    ///
    /// An empty or absent query returns nothing without touching the catalog.
    /// Options are grouped by key in listing order, values in the order the
    /// catalog returned them. Any failed lookup fails the whole search; keys
    /// that do not match are never looked up.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<SelectableOption>, CatalogError> {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Ok(Vec::new());
        };

        let matched: Vec<&LabelKey> = self.keys.matching(query).collect();
        if matched.is_empty() {
            tracing::debug!(query, "No label keys match query");
            return Ok(Vec::new());
        }

        tracing::debug!(
            catalog = self.catalog.name(),
            query,
            keys = matched.len(),
            "Searching label values"
        );

        let lookups = matched
            .iter()
            .map(|key| self.catalog.load_values_for_key(&key.id));
        let results = try_join_all(lookups).await?;

        let options: Vec<SelectableOption> = matched
            .into_iter()
            .zip(results)
            .flat_map(|(key, key_values)| {
                key_values.values.into_iter().map(move |value| SelectableOption {
                    key: key.clone(),
                    value,
                })
            })
            .collect();

        tracing::debug!(query, options = options.len(), "Search complete");
        Ok(options)
    }
}
