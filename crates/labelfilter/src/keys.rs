//! Read-only cache of the loaded label keys.

use crate::model::LabelKey;
use labelfilter_ids::KeyId;
use std::sync::Arc;

/// Snapshot of the key listing, shared by every concurrent resolution and
/// search. Cloning is cheap; the keys themselves are never mutated.
///
/// `revision` changes every time a new listing is installed, so callers can
/// tell two snapshots apart without comparing their contents.
#[derive(Debug, Clone)]
pub struct KeyCache {
    keys: Arc<[LabelKey]>,
    revision: u64,
}

impl KeyCache {
    /// The empty cache a filter starts with before its first load.
    pub fn empty() -> Self {
        Self {
            keys: Arc::from(Vec::new()),
            revision: 0,
        }
    }

    pub fn new(keys: Vec<LabelKey>, revision: u64) -> Self {
        Self {
            keys: Arc::from(keys),
            revision,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelKey> {
        self.keys.iter()
    }

    pub fn get(&self, key_id: &KeyId) -> Option<&LabelKey> {
        self.keys.iter().find(|key| &key.id == key_id)
    }

    /// Keys whose name contains `query`, ignoring case, in listing order.
    pub fn matching<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a LabelKey> + 'a {
        let needle = query.to_lowercase();
        self.keys
            .iter()
            .filter(move |key| key.name.to_lowercase().contains(&needle))
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> KeyCache {
        KeyCache::new(
            vec![
                LabelKey::new("a", "Alpha"),
                LabelKey::new("b", "Beta"),
                LabelKey::new("t", "Team Alpha"),
            ],
            1,
        )
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let cache = cache();
        let ids: Vec<_> = cache.matching("ALP").map(|k| k.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "t"]);

        let ids: Vec<_> = cache.matching("et").map(|k| k.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        assert_eq!(cache.matching("zzz").count(), 0);
    }

    #[test]
    fn test_get_by_id() {
        let cache = cache();
        assert_eq!(cache.get(&KeyId::new("b")).map(|k| k.name.as_str()), Some("Beta"));
        assert!(cache.get(&KeyId::new("Beta")).is_none());
    }

    #[test]
    fn test_empty_cache() {
        let cache = KeyCache::empty();
        assert!(cache.is_empty());
        assert_eq!(cache.revision(), 0);
        assert_eq!(cache.matching("a").count(), 0);
    }
}
