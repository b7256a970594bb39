//! The deep observer: turns value transitions into a raw change stream.
//!
//! Plain structured values cannot be watched for in-place mutation, so
//! observation happens at explicit transition points: user code mutates a
//! value inside an update closure and the observer diffs the before/after
//! pair ([`diff_transition`]). The resulting [`RawChange`] batch is delivered
//! to every subscribed listener in a single callback invocation per burst,
//! so a listener always sees the complete transition.
//!
//! Raw records address positions with `/`-separated paths (root `"/"`);
//! [`format_changes`] normalizes a batch to the dotted-path [`Change`]
//! vocabulary, resolving inserted values against the post-edit root.

mod diff;
mod format;

pub use diff::diff_transition;
pub use format::format_changes;

use std::collections::BTreeMap;

use serde_json::Value;

/// The kind of a raw observer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawChangeKind {
    Add,
    Update,
    Splice,
    Delete,
}

/// One raw observer record.
///
/// `path` is slash-form. `old_value` is present for updates and deletes;
/// `index`, `removed` and `added_count` describe splices. Values inserted by
/// adds, updates and splices are not carried here; they are resolved against
/// the post-edit root during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub kind: RawChangeKind,
    pub path: String,
    pub old_value: Option<Value>,
    pub index: Option<usize>,
    pub removed: Vec<Value>,
    pub added_count: usize,
}

impl RawChange {
    fn add(path: String) -> Self {
        RawChange {
            kind: RawChangeKind::Add,
            path,
            old_value: None,
            index: None,
            removed: Vec::new(),
            added_count: 0,
        }
    }

    fn update(path: String, old_value: Value) -> Self {
        RawChange {
            kind: RawChangeKind::Update,
            path,
            old_value: Some(old_value),
            index: None,
            removed: Vec::new(),
            added_count: 0,
        }
    }

    fn splice(path: String, index: usize, removed: Vec<Value>, added_count: usize) -> Self {
        RawChange {
            kind: RawChangeKind::Splice,
            path,
            old_value: None,
            index: Some(index),
            removed,
            added_count,
        }
    }

    fn delete(path: String, old_value: Value) -> Self {
        RawChange {
            kind: RawChangeKind::Delete,
            path,
            old_value: Some(old_value),
            index: None,
            removed: Vec::new(),
            added_count: 0,
        }
    }
}

type RawListener = Box<dyn FnMut(&[RawChange])>;

/// Listener registry over the raw change stream of one observed value.
///
/// Attaching over a primitive or absent value is an inert no-op: the
/// observer stays detached and transitions pass through unobserved.
#[derive(Default)]
pub struct DeepObserver {
    attached: bool,
    next_listener_id: u64,
    listeners: BTreeMap<u64, RawListener>,
}

impl DeepObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to `value`. Only containers (mappings and sequences) are
    /// observable; anything else leaves the observer detached.
    pub fn attach(&mut self, value: Option<&Value>) {
        self.attached = matches!(value, Some(Value::Object(_)) | Some(Value::Array(_)));
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Registers a listener for raw change batches, returning its handle.
    pub fn subscribe(&mut self, listener: impl FnMut(&[RawChange]) + 'static) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Diffs a transition and delivers the whole batch to every listener in
    /// one invocation. Returns the batch so callers can feed the protocol
    /// layer without re-diffing; detached observers yield nothing.
    pub fn emit_transition(
        &mut self,
        before: Option<&Value>,
        after: Option<&Value>,
    ) -> Vec<RawChange> {
        if !self.attached {
            return Vec::new();
        }
        let batch = diff_transition(before, after);
        if !batch.is_empty() {
            for listener in self.listeners.values_mut() {
                listener(&batch);
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn attach_over_primitives_is_inert() {
        let mut observer = DeepObserver::new();
        observer.attach(Some(&json!(42)));
        assert!(!observer.is_attached());
        observer.attach(None);
        assert!(!observer.is_attached());
        observer.attach(Some(&json!({"a": 1})));
        assert!(observer.is_attached());
        observer.detach();
        assert!(!observer.is_attached());
    }

    #[test]
    fn burst_is_coalesced_into_one_callback() {
        let mut observer = DeepObserver::new();
        observer.attach(Some(&json!({})));
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        observer.subscribe(move |batch| sink.borrow_mut().push(batch.len()));

        let before = json!({"a": 1, "b": 2});
        let after = json!({"a": 9, "c": 3});
        observer.emit_transition(Some(&before), Some(&after));

        // One invocation carrying the whole transition (update, delete, add).
        assert_eq!(calls.borrow().as_slice(), &[3]);
    }

    #[test]
    fn detached_observer_emits_nothing() {
        let mut observer = DeepObserver::new();
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        observer.subscribe(move |_| *sink.borrow_mut() += 1);

        let batch = observer.emit_transition(Some(&json!({"a": 1})), Some(&json!({"a": 2})));
        assert!(batch.is_empty());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut observer = DeepObserver::new();
        observer.attach(Some(&json!({})));
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        let id = observer.subscribe(move |_| *sink.borrow_mut() += 1);
        assert!(observer.unsubscribe(id));
        assert!(!observer.unsubscribe(id));

        observer.emit_transition(Some(&json!({"a": 1})), Some(&json!({"a": 2})));
        assert_eq!(*calls.borrow(), 0);
    }
}
