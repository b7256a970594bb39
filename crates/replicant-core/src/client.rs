//! The client-side mirror replicator.
//!
//! Keeps one mirror replicant per name: registration and first synchronize
//! make a mirror `ready`, local writes push change-lists (or whole values)
//! to the server, and inbound multicasts extend or replace the mirror
//! state. A client that diverges from the authoritative chain recovers by
//! re-synchronizing; its local edit is discarded.
//!
//! Acknowledgements are matched FIFO against the pending queue, since the
//! transport delivers replies in emission order. Fallback paths re-read the
//! live replicant state when an acknowledgement resumes; the state may have
//! moved while the ack was in flight.

use std::collections::{BTreeMap, VecDeque};

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use replicant_util::deep_equal;

use crate::change::reverse_changes;
use crate::observe::format_changes;
use crate::options::ReplicatorOptions;
use crate::replicant::Replicant;
use crate::wire::{ClientMessage, ServerEvent, ServerReply};

/// Client-side seam to the message transport.
pub trait ClientSink {
    fn emit(&mut self, message: ClientMessage);
}

#[derive(Debug, Error, PartialEq)]
pub enum ReplicantError {
    #[error("replicant {0:?} is not registered")]
    Unregistered(String),
    #[error("replicant {0:?} is not ready")]
    NotReady(String),
}

/// Continuation for an emitted message awaiting its acknowledgement.
#[derive(Debug)]
enum Pending {
    Register { name: String },
    Sync { name: String },
    Set { name: String },
    Changed { name: String },
}

struct Mirror {
    replicant: Replicant,
    ready: bool,
    ready_listeners: Vec<Box<dyn FnOnce(Option<&Value>)>>,
    change_listeners: Vec<Box<dyn FnMut(Option<&Value>)>>,
}

impl Mirror {
    fn new(name: &str) -> Self {
        Mirror {
            replicant: Replicant::new(name),
            ready: false,
            ready_listeners: Vec::new(),
            change_listeners: Vec::new(),
        }
    }

    fn notify_change(&mut self) {
        for listener in &mut self.change_listeners {
            listener(self.replicant.value());
        }
    }

    fn notify_ready(&mut self) {
        for listener in self.ready_listeners.drain(..) {
            listener(self.replicant.value());
        }
    }
}

pub struct ClientReplicator<S: ClientSink> {
    sink: S,
    options: ReplicatorOptions,
    mirrors: BTreeMap<String, Mirror>,
    pending: VecDeque<Pending>,
}

impl<S: ClientSink> ClientReplicator<S> {
    pub fn new(sink: S, options: ReplicatorOptions) -> Self {
        ClientReplicator {
            sink,
            options,
            mirrors: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn options(&self) -> &ReplicatorOptions {
        &self.options
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// References a replicant by name, creating and registering the mirror
    /// on first use. Registration is emitted exactly once per name.
    pub fn get_replicant(&mut self, name: &str) {
        if self.mirrors.contains_key(name) {
            return;
        }
        self.mirrors.insert(name.to_owned(), Mirror::new(name));
        debug!("registering replicant {name:?}");
        self.sink.emit(ClientMessage::Register {
            name: name.to_owned(),
        });
        self.pending.push_back(Pending::Register {
            name: name.to_owned(),
        });
    }

    /// The mirrored value; absent until the replicant is ready.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let mirror = self.mirrors.get(name)?;
        if !mirror.ready {
            return None;
        }
        mirror.replicant.value()
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.mirrors.get(name).is_some_and(|m| m.ready)
    }

    /// The mirror's current revision chain (diagnostic surface; empty for
    /// unknown names).
    pub fn revision_history(&self, name: &str) -> &[String] {
        self.mirrors
            .get(name)
            .map(|m| m.replicant.revision_history())
            .unwrap_or(&[])
    }

    pub fn sequence_number(&self, name: &str) -> u64 {
        self.mirrors
            .get(name)
            .map(|m| m.replicant.sequence_number())
            .unwrap_or(0)
    }

    /// One-shot readiness notification; fires immediately when the mirror
    /// is already ready.
    pub fn on_ready(
        &mut self,
        name: &str,
        listener: impl FnOnce(Option<&Value>) + 'static,
    ) -> Result<(), ReplicantError> {
        let mirror = self
            .mirrors
            .get_mut(name)
            .ok_or_else(|| ReplicantError::Unregistered(name.to_owned()))?;
        if mirror.ready {
            listener(mirror.replicant.value());
        } else {
            mirror.ready_listeners.push(Box::new(listener));
        }
        Ok(())
    }

    /// Subscribes to every subsequent value transition (local writes and
    /// server-driven updates alike).
    pub fn on_change(
        &mut self,
        name: &str,
        listener: impl FnMut(Option<&Value>) + 'static,
    ) -> Result<(), ReplicantError> {
        let mirror = self
            .mirrors
            .get_mut(name)
            .ok_or_else(|| ReplicantError::Unregistered(name.to_owned()))?;
        mirror.change_listeners.push(Box::new(listener));
        Ok(())
    }

    /// Direct assignment: replaces the whole value and pushes it through
    /// the `replicantSet` path.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ReplicantError> {
        let mirror = self.ready_mirror(name)?;
        mirror.replicant.assign_local(value);
        mirror.replicant.advance_revision();
        mirror.notify_change();

        let message = ClientMessage::Set {
            name: name.to_owned(),
            revision_history: mirror.replicant.revision_history().to_vec(),
            value: mirror
                .replicant
                .value()
                .cloned()
                .unwrap_or(Value::Null),
        };
        self.sink.emit(message);
        self.pending.push_back(Pending::Set {
            name: name.to_owned(),
        });
        Ok(())
    }

    /// Observed mutation: runs `mutate` against the value, turns the
    /// observed transition into a change-list and pushes it through the
    /// `replicantChanged` path. Degrades to assignment semantics when the
    /// observer is inert (primitive or absent value).
    pub fn update(
        &mut self,
        name: &str,
        mutate: impl FnOnce(&mut Value),
    ) -> Result<(), ReplicantError> {
        let mirror = self.ready_mirror(name)?;
        let (before, batch) = mirror.replicant.mutate_observed(mutate);

        let changes = format_changes(mirror.replicant.value(), &batch);
        if changes.is_empty() {
            let unchanged = match (before.as_ref(), mirror.replicant.value()) {
                (Some(old), Some(new)) => deep_equal(old, new),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return Ok(());
            }
            // Unobserved transition: push the whole value instead.
            mirror.replicant.advance_revision();
            mirror.notify_change();
            let message = ClientMessage::Set {
                name: name.to_owned(),
                revision_history: mirror.replicant.revision_history().to_vec(),
                value: mirror
                    .replicant
                    .value()
                    .cloned()
                    .unwrap_or(Value::Null),
            };
            self.sink.emit(message);
            self.pending.push_back(Pending::Set {
                name: name.to_owned(),
            });
            return Ok(());
        }

        // The pre-edit value recomputed from the change-list must equal the
        // snapshot taken before the mutation (the inverse law).
        debug_assert!({
            let current = mirror.replicant.value().cloned().unwrap_or(Value::Null);
            let recovered = reverse_changes(&current, &changes);
            deep_equal(&recovered, before.as_ref().unwrap_or(&Value::Null))
        });

        mirror.replicant.advance_revision();
        mirror.notify_change();
        let message = ClientMessage::Changed {
            name: name.to_owned(),
            revision_history: mirror.replicant.revision_history().to_vec(),
            changes,
        };
        self.sink.emit(message);
        self.pending.push_back(Pending::Changed {
            name: name.to_owned(),
        });
        Ok(())
    }

    /// Re-issues a synchronize for every known replicant; the reset surface
    /// for transport reconnection.
    pub fn resynchronize_all(&mut self) {
        let names: Vec<String> = self.mirrors.keys().cloned().collect();
        for name in names {
            self.synchronize(&name);
        }
    }

    /// Routes an acknowledgement to the continuation at the head of the
    /// pending queue.
    pub fn handle_reply(&mut self, reply: ServerReply) {
        let Some(pending) = self.pending.pop_front() else {
            warn!("acknowledgement arrived with no pending message");
            return;
        };
        match (pending, reply) {
            (Pending::Register { name }, ServerReply::Registered) => {
                self.synchronize(&name);
            }
            (
                Pending::Sync { name },
                ServerReply::State {
                    revision_history,
                    value,
                },
            ) => {
                let Some(mirror) = self.mirrors.get_mut(&name) else {
                    return;
                };
                mirror
                    .replicant
                    .adopt_remote_state(revision_history, value);
                mirror.notify_change();
                if !mirror.ready {
                    mirror.ready = true;
                    debug!("replicant {name:?} is ready");
                    mirror.notify_ready();
                }
            }
            (Pending::Set { name }, ServerReply::Accepted(accepted)) => {
                if !accepted {
                    // Accept defeat and adopt the server state.
                    warn!("replicantSet for {name:?} rejected; resynchronizing");
                    self.synchronize(&name);
                }
            }
            (Pending::Changed { name }, ServerReply::Accepted(accepted)) => {
                if !accepted {
                    // Heavy retry: offer the whole live value instead. The
                    // state is re-read now, not captured at emit time.
                    warn!("replicantChanged for {name:?} rejected; retrying as replicantSet");
                    let Some(mirror) = self.mirrors.get_mut(&name) else {
                        return;
                    };
                    let message = ClientMessage::Set {
                        name: name.clone(),
                        revision_history: mirror.replicant.revision_history().to_vec(),
                        value: mirror
                            .replicant
                            .value()
                            .cloned()
                            .unwrap_or(Value::Null),
                    };
                    self.sink.emit(message);
                    self.pending.push_back(Pending::Set { name });
                }
            }
            (pending, reply) => {
                warn!("acknowledgement {reply:?} does not match pending {pending:?}; dropping");
            }
        }
    }

    /// Routes an inbound room multicast.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Set {
                name,
                revision_history,
                value,
            } => {
                let Some(mirror) = self.mirrors.get_mut(&name) else {
                    return;
                };
                mirror
                    .replicant
                    .adopt_remote_state(revision_history, Some(value));
                mirror.notify_change();
            }
            ServerEvent::Changed {
                name,
                revision_history,
                changes,
            } => {
                let Some(mirror) = self.mirrors.get_mut(&name) else {
                    return;
                };
                let local = mirror.replicant.revision();
                if revision_history.first() == Some(&local) {
                    // Echo of an edit this endpoint already holds: adopt the
                    // authoritative labels without re-applying.
                    mirror.replicant.adopt_history(revision_history);
                } else if revision_history.get(1) == Some(&local) {
                    mirror
                        .replicant
                        .apply_remote_changes(revision_history, &changes);
                    mirror.notify_change();
                } else {
                    warn!("replicant {name:?} diverged from broadcast chain; resynchronizing");
                    self.synchronize(&name);
                }
            }
        }
    }

    fn synchronize(&mut self, name: &str) {
        self.sink.emit(ClientMessage::Get {
            name: name.to_owned(),
        });
        self.pending.push_back(Pending::Sync {
            name: name.to_owned(),
        });
    }

    fn ready_mirror(&mut self, name: &str) -> Result<&mut Mirror, ReplicantError> {
        let mirror = self
            .mirrors
            .get_mut(name)
            .ok_or_else(|| ReplicantError::Unregistered(name.to_owned()))?;
        if !mirror.ready {
            return Err(ReplicantError::NotReady(name.to_owned()));
        }
        Ok(mirror)
    }
}
