//! Selector resolution.
//!
//! Turns `key:value` selectors into display pairs by looking up each
//! selector's key values and picking the referenced value out of the set.

use crate::catalog::CatalogClient;
use crate::error::CatalogError;
use crate::keys::KeyCache;
use crate::model::{KeyValues, ResolvedPair, ResolvedValue};
use futures::future::try_join_all;
use labelfilter_ids::Selector;
use std::sync::Arc;

/// Resolves selectors against a catalog and a key cache snapshot.
#[derive(Clone)]
pub struct Resolver {
    catalog: Arc<dyn CatalogClient>,
    keys: KeyCache,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn CatalogClient>, keys: KeyCache) -> Self {
        Self { catalog, keys }
    }

    /// Resolve `selectors` in order.
    ///
    /// One value lookup is issued per selector, all in flight together. The
    /// result has exactly one pair per selector, in the same order. A value id
    /// that the key does not have yields [`ResolvedValue::Missing`]. Any
    /// failed lookup fails the whole call.
    pub async fn resolve(&self, selectors: &[Selector]) -> Result<Vec<ResolvedPair>, CatalogError> {
        if selectors.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            catalog = self.catalog.name(),
            lookups = selectors.len(),
            "Resolving selectors"
        );

        let lookups = selectors
            .iter()
            .map(|selector| self.catalog.load_values_for_key(selector.key_id()));
        let results = try_join_all(lookups).await?;

        Ok(selectors
            .iter()
            .zip(results)
            .map(|(selector, key_values)| self.pair_for(selector, key_values))
            .collect())
    }

    fn pair_for(&self, selector: &Selector, key_values: KeyValues) -> ResolvedPair {
        let KeyValues { key, values } = key_values;

        // Cached key wins; the echoed key only covers lookups made before the
        // listing arrived.
        let key = self.keys.get(selector.key_id()).cloned().unwrap_or(key);

        let value = selector
            .value_id()
            .and_then(|value_id| values.into_iter().find(|value| &value.id == value_id));

        ResolvedPair::new(key, ResolvedValue::from(value), selector.value_id().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::model::{LabelKey, LabelValue};

    fn catalog() -> Arc<MemoryCatalog> {
        Arc::new(
            MemoryCatalog::new()
                .with_key(
                    LabelKey::new("a", "Alpha"),
                    vec![LabelValue::new("1", "One"), LabelValue::new("2", "Two")],
                )
                .with_key(LabelKey::new("b", "Beta"), vec![LabelValue::new("x", "Ex")]),
        )
    }

    fn selectors(raw: &[&str]) -> Vec<Selector> {
        raw.iter().map(|s| Selector::parse(s)).collect()
    }

    #[tokio::test]
    async fn test_resolves_in_input_order() {
        let catalog = catalog();
        let resolver = Resolver::new(catalog.clone(), KeyCache::empty());

        let pairs = resolver.resolve(&selectors(&["b:x", "a:2", "a:1"])).await.unwrap();
        let shown: Vec<_> = pairs
            .iter()
            .map(|p| (p.key.name.as_str(), p.value.as_found().map(|v| v.name.as_str())))
            .collect();
        assert_eq!(
            shown,
            vec![("Beta", Some("Ex")), ("Alpha", Some("Two")), ("Alpha", Some("One"))]
        );
    }

    #[tokio::test]
    async fn test_one_lookup_per_selector() {
        let catalog = catalog();
        let resolver = Resolver::new(catalog.clone(), KeyCache::empty());

        resolver.resolve(&selectors(&["a:1", "a:2", "b:x"])).await.unwrap();
        assert_eq!(catalog.value_lookup_count("a"), 2);
        assert_eq!(catalog.value_lookup_count("b"), 1);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_values_are_not_errors() {
        let catalog = catalog();
        let resolver = Resolver::new(catalog.clone(), KeyCache::empty());

        let pairs = resolver.resolve(&selectors(&["a:9", "a", "a:"])).await.unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|p| p.value.is_missing()));
        assert!(pairs.iter().all(|p| p.key.name == "Alpha"));
    }

    #[tokio::test]
    async fn test_prefers_cached_key_over_echoed_key() {
        let catalog = catalog();
        let keys = KeyCache::new(vec![LabelKey::new("a", "Alpha (cached)")], 1);
        let resolver = Resolver::new(catalog.clone(), keys);

        let pairs = resolver.resolve(&selectors(&["a:1", "b:x"])).await.unwrap();
        assert_eq!(pairs[0].key.name, "Alpha (cached)");
        assert_eq!(pairs[1].key.name, "Beta");
    }

    #[tokio::test]
    async fn test_any_failed_lookup_fails_everything() {
        let catalog = catalog();
        catalog.fail_key("b");
        let resolver = Resolver::new(catalog.clone(), KeyCache::empty());

        let result = resolver.resolve(&selectors(&["a:1", "b:x"])).await;
        assert!(matches!(result, Err(CatalogError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_lookups() {
        let catalog = catalog();
        let resolver = Resolver::new(catalog.clone(), KeyCache::empty());

        assert!(resolver.resolve(&[]).await.unwrap().is_empty());
        assert_eq!(catalog.total_value_lookups(), 0);
    }
}
