//! Label filter control
//!
//! Owns the filter's lifecycle state and wires the resolver and the search
//! engine to the rendering widget:
//!
//! - **mount** loads the key listing once, then resolves the current selection
//! - **set_value** re-resolves whenever the owner hands in a new selection
//! - **load_options** backs the widget's search box
//! - **select** forwards the widget's new selection to the owner
//!
//! Resolutions may overlap. Each one is tagged with a generation when it is
//! dispatched and only the latest generation is allowed to commit, so a slow
//! early resolution can never overwrite a newer one.

use crate::catalog::{CatalogClient, CatalogMode, CatalogRegistry};
use crate::error::CatalogError;
use crate::keys::KeyCache;
use crate::model::{ResolvedPair, SelectableOption};
use crate::resolver::Resolver;
use crate::search::SearchEngine;
use labelfilter_ids::Selector;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Field of keys and values the widget displays.
pub const LABEL_FIELD: &str = "name";

/// Callback receiving the selection composed by the widget.
pub type ChangeCallback = Arc<dyn Fn(Vec<ResolvedPair>) + Send + Sync>;

/// Inputs supplied by the filter's owner.
#[derive(Debug, Clone, Default)]
pub struct FilterProps {
    /// Catalog the filter draws from; fixed for the filter's lifetime
    pub filter_type: CatalogMode,
    /// Forwarded to the widget
    pub auto_focus: bool,
    /// Current selection, owned by the caller
    pub value: Vec<Selector>,
}

/// Everything the rendering widget needs to draw the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetProps {
    pub auto_focus: bool,
    pub label_field: &'static str,
    pub value: Vec<ResolvedPair>,
}

/// What happened to a requested resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The result replaced the resolved value
    Committed,
    /// A later resolution was dispatched first; the result was dropped
    Stale,
    /// Selection and key cache were unchanged; nothing was fetched
    Unchanged,
}

/// Inputs a resolution is computed from. Equal inputs give equal output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependencies {
    selection: Vec<Selector>,
    key_revision: u64,
}

struct FilterState {
    keys: KeyCache,
    selection: Vec<Selector>,
    /// Generation of the most recently dispatched resolution
    generation: u64,
    /// Inputs of the most recently dispatched resolution
    dispatched: Option<Dependencies>,
    next_key_revision: u64,
    /// Bumped by every unmount; a key listing started under an older epoch
    /// is dropped.
    mount_epoch: u64,
    mounted: bool,
}

struct FilterInner {
    mode: CatalogMode,
    auto_focus: bool,
    catalog: Arc<dyn CatalogClient>,
    on_change: ChangeCallback,
    state: Mutex<FilterState>,
    resolved: watch::Sender<Vec<ResolvedPair>>,
}

/// Searchable `key:value` label filter.
///
/// Cheap to clone; clones share state, so overlapping resolutions can be
/// driven from separate tasks.
#[derive(Clone)]
pub struct LabelsFilter {
    inner: Arc<FilterInner>,
}

impl LabelsFilter {
    /// Create a filter whose catalog is picked from `registry` by
    /// `props.filter_type`.
    pub fn new(
        props: FilterProps,
        registry: &CatalogRegistry,
        on_change: impl Fn(Vec<ResolvedPair>) + Send + Sync + 'static,
    ) -> Result<Self, CatalogError> {
        let catalog = registry.client_for(props.filter_type)?;
        Ok(Self::with_catalog(props, catalog, on_change))
    }

    /// Create a filter backed by an explicit catalog.
    pub fn with_catalog(
        props: FilterProps,
        catalog: Arc<dyn CatalogClient>,
        on_change: impl Fn(Vec<ResolvedPair>) + Send + Sync + 'static,
    ) -> Self {
        let (resolved, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(FilterInner {
                mode: props.filter_type,
                auto_focus: props.auto_focus,
                catalog,
                on_change: Arc::new(on_change),
                state: Mutex::new(FilterState {
                    keys: KeyCache::empty(),
                    selection: props.value,
                    generation: 0,
                    dispatched: None,
                    next_key_revision: 1,
                    mount_epoch: 0,
                    mounted: false,
                }),
                resolved,
            }),
        }
    }

    pub fn mode(&self) -> CatalogMode {
        self.inner.mode
    }

    pub fn catalog_name(&self) -> &str {
        self.inner.catalog.name()
    }

    pub fn is_mounted(&self) -> bool {
        self.state().mounted
    }

    /// Snapshot of the loaded keys.
    pub fn keys(&self) -> KeyCache {
        self.state().keys.clone()
    }

    /// Selection most recently supplied by the owner.
    pub fn selection(&self) -> Vec<Selector> {
        self.state().selection.clone()
    }

    /// Last committed resolution of the selection.
    pub fn value(&self) -> Vec<ResolvedPair> {
        self.inner.resolved.borrow().clone()
    }

    /// Watch committed resolutions.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ResolvedPair>> {
        self.inner.resolved.subscribe()
    }

    pub fn widget_props(&self) -> WidgetProps {
        WidgetProps {
            auto_focus: self.inner.auto_focus,
            label_field: LABEL_FIELD,
            value: self.value(),
        }
    }

    /// Load the key listing, then resolve the current selection against it.
    ///
    /// A failed key load leaves the filter unmounted with an empty cache. A
    /// listing that arrives after [`unmount`](Self::unmount) is dropped and
    /// reported as [`ResolveOutcome::Stale`].
    pub async fn mount(&self) -> Result<ResolveOutcome, CatalogError> {
        let epoch = self.state().mount_epoch;
        let loaded = self.inner.catalog.load_keys().await?;
        let count = loaded.len();
        {
            let mut state = self.state();
            if state.mount_epoch != epoch {
                tracing::debug!(
                    mode = %self.inner.mode,
                    keys = count,
                    "Discarding key listing that finished after unmount"
                );
                return Ok(ResolveOutcome::Stale);
            }
            let revision = state.next_key_revision;
            state.next_key_revision += 1;
            state.keys = KeyCache::new(loaded, revision);
            state.mounted = true;
        }
        tracing::info!(
            catalog = self.inner.catalog.name(),
            mode = %self.inner.mode,
            keys = count,
            "Label keys loaded"
        );

        self.refresh().await
    }

    /// Drop the key cache and invalidate in-flight resolutions.
    pub fn unmount(&self) {
        let mut state = self.state();
        state.keys = KeyCache::empty();
        state.generation += 1;
        state.mount_epoch += 1;
        state.dispatched = None;
        state.mounted = false;
        tracing::debug!(mode = %self.inner.mode, "Label filter unmounted");
    }

    /// Accept a new selection from the owner and resolve it.
    pub async fn set_value(&self, selection: Vec<Selector>) -> Result<ResolveOutcome, CatalogError> {
        self.state().selection = selection;
        self.refresh().await
    }

    /// Resolve the current selection against the current key cache.
    ///
    /// Skips the fetch when neither input changed since the last dispatched
    /// resolution. On failure the resolved value is left as it was; a failure
    /// of a resolution that was already superseded is reported as
    /// [`ResolveOutcome::Stale`].
    pub async fn refresh(&self) -> Result<ResolveOutcome, CatalogError> {
        let (generation, selection, keys) = {
            let mut state = self.state();
            let deps = Dependencies {
                selection: state.selection.clone(),
                key_revision: state.keys.revision(),
            };
            if state.dispatched.as_ref() == Some(&deps) {
                return Ok(ResolveOutcome::Unchanged);
            }
            state.generation += 1;
            state.dispatched = Some(deps);
            (state.generation, state.selection.clone(), state.keys.clone())
        };

        let resolver = Resolver::new(Arc::clone(&self.inner.catalog), keys);
        let result = resolver.resolve(&selection).await;

        let mut state = self.state();
        let current = state.generation == generation;
        match result {
            Ok(pairs) if current => {
                self.inner.resolved.send_replace(pairs);
                Ok(ResolveOutcome::Committed)
            }
            Ok(_) => {
                tracing::debug!(
                    generation,
                    latest = state.generation,
                    "Discarding stale label resolution"
                );
                Ok(ResolveOutcome::Stale)
            }
            Err(err) if !current => {
                tracing::debug!(
                    generation,
                    latest = state.generation,
                    error = %err,
                    "Discarding failed stale label resolution"
                );
                Ok(ResolveOutcome::Stale)
            }
            Err(err) => {
                // Allow the same inputs to be retried.
                state.dispatched = None;
                tracing::warn!(
                    catalog = self.inner.catalog.name(),
                    error = %err,
                    "Label resolution failed; keeping previous value"
                );
                Err(err)
            }
        }
    }

    /// Options for the widget's search box.
    pub async fn load_options(&self, query: Option<&str>) -> Result<Vec<SelectableOption>, CatalogError> {
        let keys = self.keys();
        SearchEngine::new(Arc::clone(&self.inner.catalog), keys)
            .search(query)
            .await
    }

    /// Forward the selection picked in the widget to the owner.
    ///
    /// The filter does not keep it; the owner feeds it back through
    /// [`LabelsFilter::set_value`].
    pub fn select(&self, selection: Vec<ResolvedPair>) {
        (self.inner.on_change)(selection);
    }

    fn state(&self) -> MutexGuard<'_, FilterState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for LabelsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelsFilter")
            .field("mode", &self.inner.mode)
            .field("catalog", &self.inner.catalog.name())
            .field("auto_focus", &self.inner.auto_focus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::model::{LabelKey, LabelValue, ResolvedValue};
    use std::time::Duration;

    fn catalog() -> Arc<MemoryCatalog> {
        Arc::new(
            MemoryCatalog::new()
                .with_key(LabelKey::new("a", "Alpha"), vec![LabelValue::new("1", "One")])
                .with_key(LabelKey::new("b", "Beta"), vec![LabelValue::new("2", "Two")]),
        )
    }

    fn props(value: &[&str]) -> FilterProps {
        FilterProps {
            filter_type: CatalogMode::Labels,
            auto_focus: true,
            value: value.iter().map(|s| Selector::parse(s)).collect(),
        }
    }

    fn names(pairs: &[ResolvedPair]) -> Vec<String> {
        pairs
            .iter()
            .map(|p| match &p.value {
                ResolvedValue::Found(v) => format!("{}={}", p.key.name, v.name),
                ResolvedValue::Missing {} => format!("{}=?", p.key.name),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_mount_loads_keys_then_resolves() {
        let catalog = catalog();
        let filter = LabelsFilter::with_catalog(props(&["a:1", "b:9"]), catalog.clone(), |_| {});

        assert!(filter.value().is_empty());
        let outcome = filter.mount().await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Committed);
        assert!(filter.is_mounted());
        assert_eq!(filter.keys().len(), 2);
        assert_eq!(names(&filter.value()), vec!["Alpha=One", "Beta=?"]);
        assert_eq!(catalog.key_load_count(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_inputs_do_not_refetch() {
        let catalog = catalog();
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog.clone(), |_| {});
        filter.mount().await.unwrap();
        assert_eq!(catalog.value_lookup_count("a"), 1);

        let outcome = filter.set_value(vec![Selector::parse("a:1")]).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Unchanged);
        assert_eq!(catalog.value_lookup_count("a"), 1);

        let outcome = filter.set_value(vec![Selector::parse("b:2")]).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Committed);
        assert_eq!(names(&filter.value()), vec!["Beta=Two"]);
    }

    #[tokio::test]
    async fn test_key_reload_triggers_resolution_with_same_selection() {
        let catalog = catalog();
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog.clone(), |_| {});
        filter.mount().await.unwrap();
        filter.mount().await.unwrap();
        assert_eq!(catalog.key_load_count(), 2);
        assert_eq!(catalog.value_lookup_count("a"), 2);
    }

    #[tokio::test]
    async fn test_failed_resolution_keeps_previous_value_and_allows_retry() {
        let catalog = catalog();
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog.clone(), |_| {});
        filter.mount().await.unwrap();

        catalog.fail_key("b");
        let result = filter.set_value(vec![Selector::parse("b:2")]).await;
        assert!(result.is_err());
        assert_eq!(names(&filter.value()), vec!["Alpha=One"]);

        catalog.restore_key(&"b".into());
        let outcome = filter.set_value(vec![Selector::parse("b:2")]).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Committed);
        assert_eq!(names(&filter.value()), vec!["Beta=Two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_resolution_is_discarded() {
        let catalog = catalog();
        catalog.set_delay("a", Duration::from_millis(500));
        let filter = LabelsFilter::with_catalog(props(&[]), catalog.clone(), |_| {});
        filter.mount().await.unwrap();

        let slow = {
            let filter = filter.clone();
            tokio::spawn(async move { filter.set_value(vec![Selector::parse("a:1")]).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = filter.set_value(vec![Selector::parse("b:2")]).await.unwrap();
        assert_eq!(fast, ResolveOutcome::Committed);

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, ResolveOutcome::Stale);
        assert_eq!(names(&filter.value()), vec!["Beta=Two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_invalidates_in_flight_resolution() {
        let catalog = catalog();
        catalog.set_delay("a", Duration::from_millis(200));
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog.clone(), |_| {});

        let pending = {
            let filter = filter.clone();
            tokio::spawn(async move { filter.mount().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        filter.unmount();

        assert_eq!(pending.await.unwrap().unwrap(), ResolveOutcome::Stale);
        assert!(filter.value().is_empty());
        assert!(filter.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_key_listing_drops_the_listing() {
        let catalog = catalog();
        catalog.set_keys_delay(Some(Duration::from_millis(200)));
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog.clone(), |_| {});

        let pending = {
            let filter = filter.clone();
            tokio::spawn(async move { filter.mount().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        filter.unmount();

        assert_eq!(pending.await.unwrap().unwrap(), ResolveOutcome::Stale);
        assert!(!filter.is_mounted());
        assert!(filter.keys().is_empty());
        assert!(filter.value().is_empty());
        assert_eq!(catalog.total_value_lookups(), 0);

        // A later mount still works.
        catalog.set_keys_delay(None);
        assert_eq!(filter.mount().await.unwrap(), ResolveOutcome::Committed);
        assert_eq!(names(&filter.value()), vec!["Alpha=One"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_is_reported_stale() {
        let catalog = catalog();
        catalog.set_delay("b", Duration::from_millis(500));
        catalog.fail_key("b");
        let filter = LabelsFilter::with_catalog(props(&[]), catalog.clone(), |_| {});
        filter.mount().await.unwrap();

        let slow = {
            let filter = filter.clone();
            tokio::spawn(async move { filter.set_value(vec![Selector::parse("b:2")]).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = filter.set_value(vec![Selector::parse("a:1")]).await.unwrap();
        assert_eq!(fast, ResolveOutcome::Committed);

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, ResolveOutcome::Stale);
        assert_eq!(names(&filter.value()), vec!["Alpha=One"]);

        // The committed inputs are still recorded, so they are not refetched.
        let again = filter.set_value(vec![Selector::parse("a:1")]).await.unwrap();
        assert_eq!(again, ResolveOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_missing_value_round_trips_to_owner_selector() {
        let filter = LabelsFilter::with_catalog(props(&["a:9", "b:2"]), catalog(), |_| {});
        filter.mount().await.unwrap();
        assert_eq!(names(&filter.value()), vec!["Alpha=?", "Beta=Two"]);

        let wire: Vec<String> = filter
            .value()
            .iter()
            .map(|pair| pair.selector().to_string())
            .collect();
        assert_eq!(wire, vec!["a:9", "b:2"]);

        let selection = filter.value().iter().map(ResolvedPair::selector).collect();
        assert_eq!(filter.set_value(selection).await.unwrap(), ResolveOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_select_forwards_to_owner_without_committing() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let filter = LabelsFilter::with_catalog(props(&[]), catalog(), move |selection| {
            sink.lock().unwrap().push(selection);
        });
        filter.mount().await.unwrap();

        let options = filter.load_options(Some("alp")).await.unwrap();
        let selection: Vec<ResolvedPair> = options.into_iter().map(ResolvedPair::from).collect();
        filter.select(selection.clone());

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], selection);
        assert!(filter.value().is_empty());
        assert!(filter.selection().is_empty());
    }

    #[tokio::test]
    async fn test_widget_props_and_subscription() {
        let filter = LabelsFilter::with_catalog(props(&["a:1"]), catalog(), |_| {});
        let mut rx = filter.subscribe();
        filter.mount().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(names(&rx.borrow_and_update()), vec!["Alpha=One"]);

        let widget = filter.widget_props();
        assert!(widget.auto_focus);
        assert_eq!(widget.label_field, "name");
        assert_eq!(widget.value.len(), 1);
    }

    #[test]
    fn test_new_picks_catalog_by_mode() {
        let labels: Arc<dyn CatalogClient> = Arc::new(MemoryCatalog::named("labels"));
        let alert_groups: Arc<dyn CatalogClient> = Arc::new(MemoryCatalog::named("alert-groups"));
        let registry = CatalogRegistry::new()
            .with_client(CatalogMode::Labels, labels)
            .with_client(CatalogMode::AlertGroupLabels, alert_groups);

        let mut p = props(&[]);
        p.filter_type = CatalogMode::AlertGroupLabels;
        let filter = LabelsFilter::new(p, &registry, |_| {}).unwrap();
        assert_eq!(filter.catalog_name(), "alert-groups");
        assert_eq!(filter.mode(), CatalogMode::AlertGroupLabels);

        let empty = CatalogRegistry::new();
        assert!(LabelsFilter::new(props(&[]), &empty, |_| {}).is_err());
    }
}
