//! Structural transition diff producing the raw observer stream.

use replicant_util::deep_equal;
use serde_json::Value;

use super::RawChange;

/// Diffs a value transition into raw observer records.
///
/// Mapping keys produce add/update/delete records (recursing into unchanged
/// container kinds); sequence edits collapse into a single splice computed
/// over the longest common prefix and suffix; everything else is an update
/// of the position. An absent `before` against a mapping `after` yields one
/// add per top-level key, matching the shape of a first assignment to a
/// fresh replicant.
pub fn diff_transition(before: Option<&Value>, after: Option<&Value>) -> Vec<RawChange> {
    let mut out = Vec::new();
    match (before, after) {
        (None, None) => {}
        (None, Some(Value::Object(map))) => {
            for key in map.keys() {
                out.push(RawChange::add(format!("/{key}")));
            }
        }
        (None, Some(_)) => out.push(RawChange::add("/".to_owned())),
        (Some(old), None) => out.push(RawChange::delete("/".to_owned(), old.clone())),
        (Some(old), Some(new)) => diff_values("", old, new, &mut out),
    }
    out
}

fn diff_values(path: &str, before: &Value, after: &Value, out: &mut Vec<RawChange>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_val) in old {
                if !new.contains_key(key) {
                    out.push(RawChange::delete(child_path(path, key), old_val.clone()));
                }
            }
            for (key, new_val) in new {
                match old.get(key) {
                    None => out.push(RawChange::add(child_path(path, key))),
                    Some(old_val) => diff_values(&child_path(path, key), old_val, new_val, out),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => diff_sequences(path, old, new, out),
        _ => {
            if !deep_equal(before, after) {
                out.push(RawChange::update(root_or(path), before.clone()));
            }
        }
    }
}

/// Collapses a sequence transition into one splice over the region between
/// the longest common prefix and suffix.
fn diff_sequences(path: &str, before: &[Value], after: &[Value], out: &mut Vec<RawChange>) {
    let limit = before.len().min(after.len());
    let mut prefix = 0;
    while prefix < limit && deep_equal(&before[prefix], &after[prefix]) {
        prefix += 1;
    }
    let tail = limit - prefix;
    let mut suffix = 0;
    while suffix < tail
        && deep_equal(
            &before[before.len() - 1 - suffix],
            &after[after.len() - 1 - suffix],
        )
    {
        suffix += 1;
    }

    let removed: Vec<Value> = before[prefix..before.len() - suffix].to_vec();
    let added_count = after.len() - suffix - prefix;
    if removed.is_empty() && added_count == 0 {
        return;
    }
    out.push(RawChange::splice(root_or(path), prefix, removed, added_count));
}

fn child_path(path: &str, key: &str) -> String {
    format!("{path}/{key}")
}

fn root_or(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}
