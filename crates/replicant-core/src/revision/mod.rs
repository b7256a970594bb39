//! Revision labels: content-hash fingerprints of `(sequence number, value)`.
//!
//! A label is the SHA-1 hex digest of the canonical encoding of
//! `{num: seq, value: value}`. Labels are opaque equality tokens; nothing
//! inspects their length or algorithm. The revision history is the ordered
//! sequence of labels, most-recent first: position 0 is the current
//! revision and position 1 its parent.

mod canonical;

pub use canonical::canonical_stringify;

use serde_json::Value;
use sha1::{Digest, Sha1};

/// Cap on revision-history length. The tail is trimmed beyond this; the
/// first two positions carry the protocol and are never trimmed.
pub const MAX_REVISION_HISTORY: usize = 100;

/// Computes the revision label for a `(sequence number, value)` pair.
///
/// An absent value hashes as `{num: seq}` with the `value` key omitted, so
/// a never-written replicant still has a well-defined revision.
pub fn revision_label(sequence_number: u64, value: Option<&Value>) -> String {
    let mut payload = String::from("{\"num\":");
    payload.push_str(&sequence_number.to_string());
    if let Some(v) = value {
        payload.push_str(",\"value\":");
        payload.push_str(&canonical_stringify(v));
    }
    payload.push('}');

    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}
