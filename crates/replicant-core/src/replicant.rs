//! The replicant entity shared by both endpoints.
//!
//! A replicant is a named value, its current revision chain, and the deep
//! observer watching it. Server-driven writes go through the suppressed
//! paths so the observer never echoes them back out; locally-observed
//! mutations go through [`Replicant::mutate_observed`].

use serde_json::Value;

use crate::change::{apply_changes, Change};
use crate::observe::{DeepObserver, RawChange};
use crate::revision::{revision_label, MAX_REVISION_HISTORY};

pub struct Replicant {
    name: String,
    value: Option<Value>,
    sequence_number: u64,
    revision_history: Vec<String>,
    suppress_observer: bool,
    observer: DeepObserver,
}

impl Replicant {
    pub fn new(name: impl Into<String>) -> Self {
        Replicant {
            name: name.into(),
            value: None,
            sequence_number: 0,
            revision_history: Vec::new(),
            suppress_observer: false,
            observer: DeepObserver::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Revision history, most-recent first: position 0 is the current
    /// revision, position 1 its parent.
    pub fn revision_history(&self) -> &[String] {
        &self.revision_history
    }

    /// The current revision label, always computed on demand from
    /// `(sequence number, value)`. Derived and read-only; there is nothing
    /// to assign.
    pub fn revision(&self) -> String {
        revision_label(self.sequence_number, self.value.as_ref())
    }

    /// Listener registry of the deep observer watching this value.
    pub fn observer_mut(&mut self) -> &mut DeepObserver {
        &mut self.observer
    }

    /// Replaces the value without emitting anything: the observer is
    /// detached across the write and reattached after (attaching over a
    /// primitive is tolerated and leaves it inert).
    pub fn set_suppressed(&mut self, value: Option<Value>) {
        self.suppress_observer = true;
        self.observer.detach();
        self.value = value;
        self.observer.attach(self.value.as_ref());
        self.suppress_observer = false;
    }

    /// Adopts an authoritative history verbatim (trimming to the cap) and
    /// re-derives the sequence number from its length.
    pub fn adopt_history(&mut self, mut revision_history: Vec<String>) {
        revision_history.truncate(MAX_REVISION_HISTORY);
        self.sequence_number = revision_history.len() as u64;
        self.revision_history = revision_history;
    }

    /// Suppressed overwrite of the full `(value, history, sequence)` state,
    /// as performed when synchronizing against the server.
    pub fn adopt_remote_state(&mut self, revision_history: Vec<String>, value: Option<Value>) {
        self.set_suppressed(value);
        self.adopt_history(revision_history);
    }

    /// Suppressed application of a server-accepted change-list, adopting the
    /// broadcast history.
    pub fn apply_remote_changes(&mut self, revision_history: Vec<String>, changes: &[Change]) {
        let base = self.value.take().unwrap_or(Value::Null);
        let next = apply_changes(&base, changes);
        self.set_suppressed(Some(next));
        self.adopt_history(revision_history);
    }

    /// Runs a caller mutation against the value and returns the pre-edit
    /// snapshot together with the coalesced raw change batch. The batch is
    /// empty when the observer is inert (primitive or absent value) or the
    /// write is suppressed.
    pub fn mutate_observed(
        &mut self,
        mutate: impl FnOnce(&mut Value),
    ) -> (Option<Value>, Vec<RawChange>) {
        let before = self.value.clone();
        self.observer.attach(before.as_ref());
        let slot = self.value.get_or_insert(Value::Null);
        mutate(slot);
        if self.suppress_observer {
            return (before, Vec::new());
        }
        let batch = self
            .observer
            .emit_transition(before.as_ref(), self.value.as_ref());
        (before, batch)
    }

    /// Replaces the value through direct assignment (the unobserved local
    /// write path; the caller pushes the whole value).
    pub fn assign_local(&mut self, value: Value) -> Option<Value> {
        let before = self.value.take();
        self.value = Some(value);
        self.observer.attach(self.value.as_ref());
        before
    }

    /// Prepends the next revision label and trims the tail.
    ///
    /// Below the cap the sequence number tracks the history length exactly;
    /// at the cap it stays pinned there, so `revision()` keeps matching
    /// `revision_history[0]` and independently synchronized endpoints keep
    /// computing identical labels.
    pub fn advance_revision(&mut self) {
        let next_seq = (self.revision_history.len() as u64 + 1).min(MAX_REVISION_HISTORY as u64);
        let label = revision_label(next_seq, self.value.as_ref());
        self.revision_history.insert(0, label);
        self.revision_history.truncate(MAX_REVISION_HISTORY);
        self.sequence_number = self.revision_history.len() as u64;
    }
}
