//! Searchable `key:value` label filter.
//!
//! Provides:
//! - **Resolver**: turns serialized `key:value` selectors into display pairs
//! - **SearchEngine**: turns a free-text query into selectable options
//! - **LabelsFilter**: lifecycle and glue between the two and a rendering widget
//! - **Catalogs**: HTTP and in-memory backends behind [`CatalogClient`]

pub mod catalog;
pub mod config;
pub mod control;
pub mod error;
pub mod keys;
pub mod model;
pub mod resolver;
pub mod search;

pub use catalog::{CatalogClient, CatalogMode, CatalogRegistry, HttpCatalog, MemoryCatalog};
pub use config::{load_config, load_default_config, CatalogConfig, FilterSettings, LabelFilterConfig};
pub use control::{FilterProps, LabelsFilter, ResolveOutcome, WidgetProps};
pub use error::{CatalogError, ConfigError};
pub use keys::KeyCache;
pub use labelfilter_ids::{KeyId, Selector, ValueId};
pub use model::{KeyValues, LabelKey, LabelValue, ResolvedPair, ResolvedValue, SelectableOption};
pub use resolver::Resolver;
pub use search::SearchEngine;
