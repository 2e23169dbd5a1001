//! Label catalog data model.
//!
//! Keys and values are immutable once loaded; a refresh replaces the whole set.

use labelfilter_ids::{KeyId, Selector, ValueId};
use serde::{Deserialize, Serialize};

/// A label key as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelKey {
    pub id: KeyId,
    /// Human-readable name; this is what search matches against.
    pub name: String,
}

impl LabelKey {
    pub fn new(id: impl Into<KeyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A label value, scoped to its parent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelValue {
    pub id: ValueId,
    pub name: String,
}

impl LabelValue {
    pub fn new(id: impl Into<ValueId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Response of a value lookup: the key echoed back with all of its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValues {
    pub key: LabelKey,
    #[serde(default)]
    pub values: Vec<LabelValue>,
}

/// Value side of a resolved pair.
///
/// `Missing` serializes as `{}` and stands for a value id that was not in the
/// key's value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Found(LabelValue),
    Missing {},
}

impl ResolvedValue {
    pub fn as_found(&self) -> Option<&LabelValue> {
        match self {
            ResolvedValue::Found(value) => Some(value),
            ResolvedValue::Missing {} => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ResolvedValue::Missing {})
    }
}

impl From<Option<LabelValue>> for ResolvedValue {
    fn from(value: Option<LabelValue>) -> Self {
        match value {
            Some(value) => ResolvedValue::Found(value),
            None => ResolvedValue::Missing {},
        }
    }
}

/// A selector materialized into display objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPair {
    pub key: LabelKey,
    pub value: ResolvedValue,
    /// Value id the selector asked for. Kept so a `Missing` pair still
    /// serializes back to the selector it came from.
    #[serde(skip)]
    pub requested: Option<ValueId>,
}

impl ResolvedPair {
    pub fn new(key: LabelKey, value: ResolvedValue, requested: Option<ValueId>) -> Self {
        Self {
            key,
            value,
            requested,
        }
    }

    /// Serialize back to the `key:value` wire form.
    ///
    /// A missing value keeps the requested value id; a pair without one
    /// yields a key-only selector.
    pub fn selector(&self) -> Selector {
        let value_id = match &self.value {
            ResolvedValue::Found(value) => Some(&value.id),
            ResolvedValue::Missing {} => self.requested.as_ref(),
        };
        match value_id {
            Some(value_id) => Selector::new(self.key.id.clone(), value_id.clone()),
            None => Selector::key_only(self.key.id.clone()),
        }
    }
}

/// A candidate offered to the rendering widget by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableOption {
    pub key: LabelKey,
    pub value: LabelValue,
}

impl SelectableOption {
    pub fn selector(&self) -> Selector {
        Selector::new(self.key.id.clone(), self.value.id.clone())
    }
}

impl From<SelectableOption> for ResolvedPair {
    fn from(option: SelectableOption) -> Self {
        let requested = Some(option.value.id.clone());
        Self {
            key: option.key,
            value: ResolvedValue::Found(option.value),
            requested,
        }
    }
}
