//! The change-list vocabulary: tagged atomic edits over a structured value.
//!
//! A change-list is an ordered sequence of [`Change`] records; applying the
//! records in order transforms one value snapshot into the next, and
//! reversing them in reverse order restores the original snapshot
//! ([`apply_changes`] / [`reverse_changes`]).
//!
//! The wire form carries a `type` tag (`add`, `update`, `splice`, `delete`)
//! and camelCase field names; dotted paths address the edited position.

mod apply;

pub use apply::{apply_changes, reverse_changes};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One atomic edit at a dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Change {
    /// Create a previously-absent position.
    #[serde(rename_all = "camelCase")]
    Add { path: String, new_value: Value },

    /// Replace an existing value at an existing position.
    #[serde(rename_all = "camelCase")]
    Update {
        path: String,
        old_value: Value,
        new_value: Value,
    },

    /// In the sequence at `path`, remove `removed_count` elements starting at
    /// `index` and insert `added` there.
    #[serde(rename_all = "camelCase")]
    Splice {
        path: String,
        index: usize,
        removed: Vec<Value>,
        removed_count: usize,
        added: Vec<Value>,
        added_count: usize,
    },

    /// Remove a position.
    #[serde(rename_all = "camelCase")]
    Delete { path: String, old_value: Value },
}

impl Change {
    /// The wire tag of this change.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Add { .. } => "add",
            Change::Update { .. } => "update",
            Change::Splice { .. } => "splice",
            Change::Delete { .. } => "delete",
        }
    }

    /// The dotted path this change addresses.
    pub fn path(&self) -> &str {
        match self {
            Change::Add { path, .. } => path,
            Change::Update { path, .. } => path,
            Change::Splice { path, .. } => path,
            Change::Delete { path, .. } => path,
        }
    }
}
