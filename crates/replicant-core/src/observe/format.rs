//! Normalization of raw observer records into the change-list vocabulary.

use replicant_util::deep_clone;
use serde_json::Value;

use super::{RawChange, RawChangeKind};
use crate::change::Change;
use crate::value_path::{get_at, slash_to_dotted};

/// Converts a raw observer batch into [`Change`] records.
///
/// Paths are normalized to dotted form; values introduced by adds, updates
/// and splices are resolved against `root_after` (the post-edit value). Raw
/// records whose inserted value cannot be resolved are dropped, keeping the
/// codec's tolerance policy.
pub fn format_changes(root_after: Option<&Value>, batch: &[RawChange]) -> Vec<Change> {
    let mut changes = Vec::with_capacity(batch.len());
    for raw in batch {
        let path = slash_to_dotted(&raw.path);
        match raw.kind {
            RawChangeKind::Add => {
                let Some(new_value) = resolve(root_after, &path) else {
                    continue;
                };
                changes.push(Change::Add { path, new_value });
            }
            RawChangeKind::Update => {
                let (Some(old_value), Some(new_value)) =
                    (raw.old_value.clone(), resolve(root_after, &path))
                else {
                    continue;
                };
                changes.push(Change::Update {
                    path,
                    old_value,
                    new_value,
                });
            }
            RawChangeKind::Splice => {
                let index = raw.index.unwrap_or(0);
                let added = spliced_in(root_after, &path, index, raw.added_count);
                changes.push(Change::Splice {
                    path,
                    index,
                    removed: raw.removed.clone(),
                    removed_count: raw.removed.len(),
                    added_count: added.len(),
                    added,
                });
            }
            RawChangeKind::Delete => {
                let Some(old_value) = raw.old_value.clone() else {
                    continue;
                };
                changes.push(Change::Delete { path, old_value });
            }
        }
    }
    changes
}

fn resolve(root: Option<&Value>, path: &str) -> Option<Value> {
    get_at(root?, path).map(deep_clone)
}

/// Reads back the elements a splice inserted: the `added_count` elements at
/// `index` in the post-edit sequence.
fn spliced_in(root: Option<&Value>, path: &str, index: usize, added_count: usize) -> Vec<Value> {
    let Some(Value::Array(items)) = root.and_then(|r| get_at(r, path)) else {
        return Vec::new();
    };
    let start = index.min(items.len());
    let end = start.saturating_add(added_count).min(items.len());
    items[start..end].iter().map(deep_clone).collect()
}
