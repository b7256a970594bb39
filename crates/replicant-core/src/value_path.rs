//! Dotted-path addressing into structured values.
//!
//! A path is a `.`-delimited string of segments addressing a nested position:
//! `"players.0.score"`. A decimal segment indexes a sequence when the parent
//! is a sequence and otherwise acts as a plain mapping key. The empty path
//! addresses the document root. Keys that themselves contain dots are not
//! supported.
//!
//! The deep observer emits `/`-separated paths (`"/players/0/score"`, root
//! `"/"`); [`slash_to_dotted`] normalizes those to the dotted form used
//! everywhere else.

use serde_json::{Map, Value};

/// Splits a dotted path into segments. The empty path has no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').collect()
}

/// Converts an observer slash-path (`"/a/b/0"`, root `"/"`) to dotted form.
pub fn slash_to_dotted(path: &str) -> String {
    path.trim_start_matches('/').replace('/', ".")
}

/// Resolves the value at `path`, or `None` when any segment is missing.
pub fn get_at<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = doc;
    for segment in split_path(path) {
        cur = match cur {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Sets the value at `path`, creating intermediate mappings as needed.
///
/// An empty path replaces the whole document. A numeric terminal segment on a
/// sequence overwrites in range, appends at the length, and pads shorter
/// sequences with nulls. Returns `false` when the position cannot be
/// addressed (for example a non-numeric key under a sequence); the caller is
/// expected to drop such writes silently.
pub fn set_at(doc: &mut Value, path: &str, value: Value) -> bool {
    if path.is_empty() {
        *doc = value;
        return true;
    }
    let segments = split_path(path);
    let (parents, leaf) = segments.split_at(segments.len() - 1);
    let Some(parent) = descend_creating(doc, parents) else {
        return false;
    };
    match parent {
        Value::Object(map) => {
            map.insert(leaf[0].to_string(), value);
            true
        }
        Value::Array(items) => match leaf[0].parse::<usize>() {
            Ok(idx) => {
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Null);
                }
                items[idx] = value;
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

/// Removes the terminal slot at `path`, returning the removed value.
///
/// Missing paths are tolerated (`None`). Removing a sequence position shifts
/// the elements after it. The root cannot be deleted.
pub fn delete_at(doc: &mut Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let segments = split_path(path);
    let (parents, leaf) = segments.split_at(segments.len() - 1);
    let parent = descend(doc, parents)?;
    match parent {
        Value::Object(map) => map.remove(leaf[0]),
        Value::Array(items) => {
            let idx = leaf[0].parse::<usize>().ok()?;
            if idx < items.len() {
                Some(items.remove(idx))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Resolves the sequence at `path`, coercing absent or non-sequence targets
/// into a fresh empty sequence (splices tolerate out-of-order creation).
pub fn ensure_sequence_at<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Vec<Value>> {
    if path.is_empty() {
        if !doc.is_array() {
            *doc = Value::Array(Vec::new());
        }
        return doc.as_array_mut();
    }
    let segments = split_path(path);
    let (parents, leaf) = segments.split_at(segments.len() - 1);
    let parent = descend_creating(doc, parents)?;
    let slot = match parent {
        Value::Object(map) => map.entry(leaf[0].to_string()).or_insert(Value::Null),
        Value::Array(items) => {
            let idx = leaf[0].parse::<usize>().ok()?;
            if idx >= items.len() {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        _ => return None,
    };
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut()
}

fn descend<'a>(doc: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut cur = doc;
    for segment in segments {
        cur = match cur {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Walks `segments`, materializing empty mappings for missing or scalar
/// intermediate positions.
fn descend_creating<'a>(doc: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut cur = doc;
    for segment in segments {
        cur = match cur {
            Value::Array(items) => {
                let idx = segment.parse::<usize>().ok()?;
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Null);
                }
                let slot = &mut items[idx];
                if !slot.is_object() && !slot.is_array() {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
            other => {
                if !other.is_object() {
                    *other = Value::Object(Map::new());
                }
                let map = other.as_object_mut()?;
                let slot = map.entry(segment.to_string()).or_insert(Value::Null);
                if !slot.is_object() && !slot.is_array() {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
        };
    }
    Some(cur)
}
