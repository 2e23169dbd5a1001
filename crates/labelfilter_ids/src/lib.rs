//! Identifier wrappers for label keys and values, plus the `key:value`
//! selector exchanged with the owner of a label filter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between key id and value id in a serialized selector.
pub const SELECTOR_SEPARATOR: char = ':';

macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

define_string_id!(KeyId);
define_string_id!(ValueId);

/// A serialized `"<keyId>:<valueId>"` selector.
///
/// Parsing never fails. The first colon-delimited part is the key id and the
/// second part (if any) is the value id; a selector without a second part
/// carries no value id and resolves to "not found" downstream. Parts after
/// the second are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Selector {
    key_id: KeyId,
    value_id: Option<ValueId>,
}

impl Selector {
    pub fn new(key_id: impl Into<KeyId>, value_id: impl Into<ValueId>) -> Self {
        Self {
            key_id: key_id.into(),
            value_id: Some(value_id.into()),
        }
    }

    /// A selector naming only a key; it never matches a value.
    pub fn key_only(key_id: impl Into<KeyId>) -> Self {
        Self {
            key_id: key_id.into(),
            value_id: None,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(SELECTOR_SEPARATOR);
        let key_id = KeyId::new(parts.next().unwrap_or_default());
        let value_id = parts.next().map(ValueId::new);
        Self { key_id, value_id }
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn value_id(&self) -> Option<&ValueId> {
        self.value_id.as_ref()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value_id {
            Some(value_id) => write!(f, "{}{}{}", self.key_id, SELECTOR_SEPARATOR, value_id),
            None => write!(f, "{}", self.key_id),
        }
    }
}

impl std::str::FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        value.to_string()
    }
}
