//! In-memory label catalog
//!
//! Serves a fixed key/value set, either built in code or loaded from a JSON
//! fixture file. Records lookup counts and supports injected failures and
//! per-key latency, so it doubles as the catalog used in tests.

use super::{CatalogClient, CatalogMode};
use crate::error::CatalogError;
use crate::model::{KeyValues, LabelKey, LabelValue};
use async_trait::async_trait;
use labelfilter_ids::KeyId;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One key of a fixture file, with its values inline.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureKey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub values: Vec<LabelValue>,
}

/// Fixture file layout: a `keys` list served in every mode, and optional
/// per-mode lists that take precedence over it.
///
/// ```json
/// { "keys": [{ "id": "team", "name": "Team", "values": [{ "id": "sre", "name": "SRE" }] }],
///   "alert_group_labels": [] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub keys: Option<Vec<FixtureKey>>,
    #[serde(default)]
    pub labels: Option<Vec<FixtureKey>>,
    #[serde(default)]
    pub alert_group_labels: Option<Vec<FixtureKey>>,
}

impl CatalogFixture {
    /// Read a fixture file. A fixture that serves no mode is rejected.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Fixture(format!("{}: {}", path.display(), e)))?;
        let fixture: Self = serde_json::from_str(&content)
            .map_err(|e| CatalogError::Fixture(format!("{}: {}", path.display(), e)))?;
        if fixture.modes().is_empty() {
            return Err(CatalogError::Fixture(format!(
                "{}: no key list; expected \"keys\", \"labels\" or \"alert_group_labels\"",
                path.display()
            )));
        }
        Ok(fixture)
    }

    /// Modes this fixture can serve.
    pub fn modes(&self) -> Vec<CatalogMode> {
        CatalogMode::ALL
            .into_iter()
            .filter(|mode| self.keys_for(*mode).is_some())
            .collect()
    }

    fn keys_for(&self, mode: CatalogMode) -> Option<&Vec<FixtureKey>> {
        let per_mode = match mode {
            CatalogMode::Labels => self.labels.as_ref(),
            CatalogMode::AlertGroupLabels => self.alert_group_labels.as_ref(),
        };
        per_mode.or(self.keys.as_ref())
    }

    /// Build the catalog for `mode`, if the fixture defines one.
    pub fn catalog_for(&self, mode: CatalogMode) -> Option<MemoryCatalog> {
        let keys = self.keys_for(mode)?;

        let mut catalog = MemoryCatalog::named(format!("fixture:{}", mode));
        for key in keys {
            catalog = catalog.with_key(
                LabelKey::new(key.id.as_str(), key.name.as_str()),
                key.values.clone(),
            );
        }
        Some(catalog)
    }
}

/// Catalog holding its whole key/value set in memory.
pub struct MemoryCatalog {
    name: String,
    entries: Vec<(LabelKey, Vec<LabelValue>)>,
    fail_keys_listing: Mutex<bool>,
    keys_delay: Mutex<Option<Duration>>,
    failing_keys: Mutex<HashSet<KeyId>>,
    delays: Mutex<HashMap<KeyId, Duration>>,
    value_lookups: Mutex<HashMap<KeyId, usize>>,
    key_loads: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            fail_keys_listing: Mutex::new(false),
            keys_delay: Mutex::new(None),
            failing_keys: Mutex::new(HashSet::new()),
            delays: Mutex::new(HashMap::new()),
            value_lookups: Mutex::new(HashMap::new()),
            key_loads: AtomicUsize::new(0),
        }
    }

    /// Add a key with its values. Keys are listed in insertion order.
    pub fn with_key(mut self, key: LabelKey, values: Vec<LabelValue>) -> Self {
        self.entries.retain(|(existing, _)| existing.id != key.id);
        self.entries.push((key, values));
        self
    }

    /// Make every value lookup for `key_id` fail.
    pub fn fail_key(&self, key_id: impl Into<KeyId>) {
        lock(&self.failing_keys).insert(key_id.into());
    }

    pub fn restore_key(&self, key_id: &KeyId) {
        lock(&self.failing_keys).remove(key_id);
    }

    /// Make the key listing fail (or succeed again).
    pub fn fail_keys_listing(&self, fail: bool) {
        *lock(&self.fail_keys_listing) = fail;
    }

    /// Delay the key listing by `delay`, or remove the delay with `None`.
    pub fn set_keys_delay(&self, delay: Option<Duration>) {
        *lock(&self.keys_delay) = delay;
    }

    /// Delay every value lookup for `key_id` by `delay`.
    pub fn set_delay(&self, key_id: impl Into<KeyId>, delay: Duration) {
        lock(&self.delays).insert(key_id.into(), delay);
    }

    pub fn clear_delay(&self, key_id: &KeyId) {
        lock(&self.delays).remove(key_id);
    }

    /// Number of value lookups issued for `key_id`.
    pub fn value_lookup_count(&self, key_id: &str) -> usize {
        lock(&self.value_lookups)
            .iter()
            .filter(|(id, _)| id.as_str() == key_id)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Number of value lookups issued for any key.
    pub fn total_value_lookups(&self) -> usize {
        lock(&self.value_lookups).values().sum()
    }

    /// Number of times the key listing was requested.
    pub fn key_load_count(&self) -> usize {
        self.key_loads.load(Ordering::SeqCst)
    }

    fn entry(&self, key_id: &KeyId) -> Option<&(LabelKey, Vec<LabelValue>)> {
        self.entries.iter().find(|(key, _)| &key.id == key_id)
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_keys(&self) -> Result<Vec<LabelKey>, CatalogError> {
        self.key_loads.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.keys_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *lock(&self.fail_keys_listing) {
            return Err(CatalogError::KeysUnavailable(format!(
                "{} refused to list keys",
                self.name
            )));
        }
        Ok(self.entries.iter().map(|(key, _)| key.clone()).collect())
    }

    async fn load_values_for_key(&self, key_id: &KeyId) -> Result<KeyValues, CatalogError> {
        *lock(&self.value_lookups).entry(key_id.clone()).or_insert(0) += 1;

        let delay = lock(&self.delays).get(key_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.failing_keys).contains(key_id) {
            return Err(CatalogError::Unavailable {
                key_id: key_id.clone(),
                message: format!("{} is failing lookups for this key", self.name),
            });
        }

        let (key, values) = self
            .entry(key_id)
            .ok_or_else(|| CatalogError::UnknownKey(key_id.clone()))?;
        Ok(KeyValues {
            key: key.clone(),
            values: values.clone(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
