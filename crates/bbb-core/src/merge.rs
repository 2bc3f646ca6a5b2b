//! Header list and option map merging.
//!
//! The two helpers use opposite precedence and callers rely on each:
//! - [`merge_headers`]: the last list mentioning a header name wins
//!   (pass `[defaults, overrides]`).
//! - [`merge_recursive`]: the first map wins on conflicting scalars
//!   (pass `[mandated, caller, defaults]`).

use serde_json::{Map, Value};

use crate::error::{BbbError, BbbResult};

const HEADER_SEPARATOR: &str = ": ";

/// Merges `"Name: Value"` header lists, later lists overriding earlier ones.
///
/// Header names compare case-insensitively and are emitted lowercased,
/// one entry per name, in the order each name was first seen.
///
/// # Errors
///
/// Returns [`crate::ErrorKind::InvalidArgument`] for an entry without a
/// `": "` separator.
pub fn merge_headers<L, S>(lists: &[L]) -> BbbResult<Vec<String>>
where
    L: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut merged: Vec<(String, String)> = Vec::new();

    for list in lists {
        for header in list.as_ref() {
            let header = header.as_ref();
            let (name, value) = header.split_once(HEADER_SEPARATOR).ok_or_else(|| {
                BbbError::invalid_argument(format!(
                    "malformed header {:?} (string): expected \"Name: Value\"",
                    header
                ))
            })?;

            let name = name.trim().to_ascii_lowercase();
            match merged.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => merged.push((name, value.to_string())),
            }
        }
    }

    Ok(merged
        .into_iter()
        .map(|(name, value)| format!("{}{}{}", name, HEADER_SEPARATOR, value))
        .collect())
}

/// Reads a header list out of a dynamic option value.
///
/// Accepts an array (or an index-keyed object, as produced by
/// [`merge_recursive`]) of strings; `null` reads as an empty list.
///
/// # Errors
///
/// Returns [`crate::ErrorKind::InvalidArgument`] naming the offending value
/// and its type when an entry is not a string.
pub fn header_list_from_value(value: &Value) -> BbbResult<Vec<String>> {
    let entries: Vec<&Value> = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        other => {
            return Err(BbbError::invalid_argument(format!(
                "header list must be an array, got {} ({})",
                other,
                type_name(other)
            )));
        }
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(s) => Ok(s.clone()),
            other => Err(BbbError::invalid_argument(format!(
                "header must be a string, got {} ({})",
                other,
                type_name(other)
            ))),
        })
        .collect()
}

/// Deep-merges option maps; the first map has the highest priority.
///
/// Maps are folded from last to first. When both sides of a key hold a
/// collection (object or array):
/// - `reorder_nested == false`: the collections are merged key by key
///   (index by index for two arrays), recursively.
/// - `reorder_nested == true`: the higher-priority collection's values are
///   followed by the other's, as one array.
///
/// Top-level keys keep their identity; nothing is re-indexed.
pub fn merge_recursive(reorder_nested: bool, maps: &[&Map<String, Value>]) -> Map<String, Value> {
    let mut acc = Map::new();
    for map in maps.iter().rev() {
        merge_into(&mut acc, map, reorder_nested);
    }
    acc
}

/// Merges `incoming` (higher priority) into `acc`.
fn merge_into(acc: &mut Map<String, Value>, incoming: &Map<String, Value>, reorder_nested: bool) {
    for (key, value) in incoming {
        let merged = match acc.get(key) {
            Some(existing) if is_collection(existing) && is_collection(value) => {
                merge_collections(value, existing, reorder_nested)
            }
            _ => value.clone(),
        };
        acc.insert(key.clone(), merged);
    }
}

fn merge_collections(winner: &Value, other: &Value, reorder_nested: bool) -> Value {
    if reorder_nested {
        let mut items = collection_values(winner);
        items.extend(collection_values(other));
        return Value::Array(items);
    }

    match (winner, other) {
        (Value::Array(first), Value::Array(second)) => {
            let len = first.len().max(second.len());
            let items = (0..len)
                .map(|i| match (first.get(i), second.get(i)) {
                    (Some(a), Some(b)) if is_collection(a) && is_collection(b) => {
                        merge_collections(a, b, false)
                    }
                    (Some(a), _) => a.clone(),
                    (None, Some(b)) => b.clone(),
                    (None, None) => Value::Null,
                })
                .collect();
            Value::Array(items)
        }
        _ => {
            let mut acc = as_object(other);
            merge_into(&mut acc, &as_object(winner), false);
            Value::Object(acc)
        }
    }
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn collection_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        other => vec![other.clone()],
    }
}

/// Views an array as an index-keyed object.
fn as_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        _ => Map::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
