//! Forward application and inverse reversal of change-lists.

use replicant_util::deep_clone;
use serde_json::Value;

use super::Change;
use crate::value_path::{delete_at, ensure_sequence_at, set_at};

/// Applies `changes` in order to a deep copy of `value`.
///
/// The input is never mutated. Malformed changes (unaddressable positions)
/// are dropped, not raised; a splice whose target is not a sequence treats
/// the target as an empty sequence, which tolerates out-of-order creation
/// signals.
pub fn apply_changes(value: &Value, changes: &[Change]) -> Value {
    let mut doc = deep_clone(value);
    for change in changes {
        match change {
            Change::Add { path, new_value } | Change::Update {
                path, new_value, ..
            } => {
                let _ = set_at(&mut doc, path, deep_clone(new_value));
            }
            Change::Splice {
                path,
                index,
                removed_count,
                added,
                ..
            } => splice(&mut doc, path, *index, *removed_count, added),
            Change::Delete { path, .. } => {
                let _ = delete_at(&mut doc, path);
            }
        }
    }
    doc
}

/// Undoes `changes` against a deep copy of `value`, walking the list in
/// reverse order.
///
/// `reverse_changes(apply_changes(v, cs), cs)` deep-equals `v` for any
/// change-list the deep observer can produce. Missing paths are silently
/// tolerated; they occur when replaying partially-applied histories.
pub fn reverse_changes(value: &Value, changes: &[Change]) -> Value {
    let mut doc = deep_clone(value);
    for change in changes.iter().rev() {
        match change {
            Change::Add { path, .. } => {
                let _ = delete_at(&mut doc, path);
            }
            Change::Update {
                path, old_value, ..
            }
            | Change::Delete { path, old_value } => {
                let _ = set_at(&mut doc, path, deep_clone(old_value));
            }
            Change::Splice {
                path,
                index,
                removed,
                added_count,
                ..
            } => splice(&mut doc, path, *index, *added_count, removed),
        }
    }
    doc
}

/// Removes `remove_count` elements at `index` in the sequence at `path` and
/// inserts `insert` there. Out-of-range bounds are clamped.
fn splice(doc: &mut Value, path: &str, index: usize, remove_count: usize, insert: &[Value]) {
    let Some(seq) = ensure_sequence_at(doc, path) else {
        return;
    };
    let start = index.min(seq.len());
    let end = start.saturating_add(remove_count).min(seq.len());
    seq.splice(start..end, insert.iter().map(deep_clone));
}
