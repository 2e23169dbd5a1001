//! Plain-text and JSON rendering of command results.

use anyhow::Result;
use labelfilter::{LabelKey, ResolvedPair, ResolvedValue, SelectableOption, Selector};
use serde::Serialize;

const NOT_FOUND: &str = "(not found)";

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn keys(keys: &[LabelKey], json: bool) -> Result<String> {
    if json {
        return to_json(keys);
    }
    Ok(keys
        .iter()
        .map(|key| format!("{}\t{}", key.id, key.name))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// One line per pair: the input selector, then `Key = Value`.
pub fn resolved(selectors: &[Selector], pairs: &[ResolvedPair], json: bool) -> Result<String> {
    if json {
        return to_json(pairs);
    }
    Ok(selectors
        .iter()
        .zip(pairs)
        .map(|(selector, pair)| {
            let value = match &pair.value {
                ResolvedValue::Found(value) => value.name.as_str(),
                ResolvedValue::Missing {} => NOT_FOUND,
            };
            format!("{}\t{} = {}", selector, pair.key.name, value)
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn options(options: &[SelectableOption], json: bool) -> Result<String> {
    if json {
        return to_json(options);
    }
    Ok(options
        .iter()
        .map(|option| format!("{}\t{} = {}", option.selector(), option.key.name, option.value.name))
        .collect::<Vec<_>>()
        .join("\n"))
}
