//! The authoritative server replicator.
//!
//! Owns the canonical replicant per name, validates inbound edits against
//! the revision chain, and multicasts accepted updates to the per-name
//! broadcast room. Handlers run to completion on a single thread; the
//! multicast for an accepted edit is emitted before the next inbound edit
//! for the same replicant can be processed, so every subscriber witnesses a
//! monotonically extending history chain.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use crate::change::{apply_changes, Change};
use crate::options::ReplicatorOptions;
use crate::replicant::Replicant;
use crate::wire::{ClientMessage, ServerEvent, ServerReply};

/// Transport handle for one connected client channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SocketId(pub u64);

/// Server-side seam to the message transport: sub-channel selection, room
/// membership and room multicast. Multicasts are fire-and-forget; no
/// acknowledgement is awaited.
pub trait RoomSink {
    /// Switches the transport onto the named sub-channel. Invoked once, at
    /// replicator construction, and only when a non-default namespace is
    /// configured; the transport stays on its default channel otherwise.
    fn select_namespace(&mut self, namespace: &str);
    fn join(&mut self, socket: SocketId, room: &str);
    fn multicast(&mut self, room: &str, event: ServerEvent);
}

pub struct ServerReplicator<S: RoomSink> {
    sink: S,
    options: ReplicatorOptions,
    replicants: BTreeMap<String, Replicant>,
}

impl<S: RoomSink> ServerReplicator<S> {
    pub fn new(mut sink: S, options: ReplicatorOptions) -> Self {
        if options.has_custom_namespace() {
            debug!("selecting transport namespace {:?}", options.namespace);
            sink.select_namespace(&options.namespace);
        }
        ServerReplicator {
            sink,
            options,
            replicants: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &ReplicatorOptions {
        &self.options
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The authoritative replicant for `name`, if it has ever been
    /// referenced.
    pub fn replicant(&self, name: &str) -> Option<&Replicant> {
        self.replicants.get(name)
    }

    /// Handles one inbound client message, returning the acknowledgement
    /// reply. Accepted edits are multicast to the room before this returns.
    pub fn handle_message(&mut self, socket: SocketId, message: ClientMessage) -> ServerReply {
        match message {
            ClientMessage::Register { name } => {
                self.ensure_replicant(&name);
                let room = self.options.room_for(&name);
                self.sink.join(socket, &room);
                debug!("socket {socket:?} registered for replicant {name:?}");
                ServerReply::Registered
            }
            ClientMessage::Get { name } => {
                let replicant = self.ensure_replicant(&name);
                ServerReply::State {
                    revision_history: replicant.revision_history().to_vec(),
                    value: replicant.value().cloned(),
                }
            }
            ClientMessage::Set {
                name,
                revision_history: client_history,
                value,
            } => self.handle_set(&name, client_history, value),
            ClientMessage::Changed {
                name,
                revision_history: client_history,
                changes,
            } => self.handle_changed(&name, client_history, changes),
        }
    }

    /// Full-value replacement: the heavy path used by clients that lost
    /// sync. Accepted when the client's chain still contains the server's
    /// current head anywhere (or the server has no history yet).
    fn handle_set(
        &mut self,
        name: &str,
        client_history: Vec<String>,
        value: Value,
    ) -> ServerReply {
        let replicant = self.ensure_replicant(name);
        let accept = match replicant.revision_history().first() {
            None => true,
            Some(head) => client_history.contains(head),
        };
        if !accept {
            warn!("rejected replicantSet for {name:?}: client chain misses the current head");
            return ServerReply::Accepted(false);
        }

        // Adopt the client's parent chain; the freshly pushed revision
        // becomes the new head.
        let adopted: Vec<String> = client_history.into_iter().skip(1).collect();
        replicant.adopt_history(adopted);
        self.push_changes(name, Some(value), None);
        ServerReply::Accepted(true)
    }

    /// Incremental edit: accepted only when the client's parent is the
    /// server's current head (compared as options, so the very first edit of
    /// a fresh replicant matches).
    fn handle_changed(
        &mut self,
        name: &str,
        client_history: Vec<String>,
        changes: Vec<Change>,
    ) -> ServerReply {
        let replicant = self.ensure_replicant(name);
        if client_history.get(1) != replicant.revision_history().first() {
            warn!("rejected replicantChanged for {name:?}: stale parent revision");
            return ServerReply::Accepted(false);
        }

        let base = replicant.value().cloned().unwrap_or(Value::Null);
        let next = apply_changes(&base, &changes);
        self.push_changes(name, Some(next), Some(changes));
        ServerReply::Accepted(true)
    }

    /// Commits an accepted update: suppressed value write, revision advance,
    /// then room multicast (`replicantChanged` when changes are present,
    /// `replicantSet` otherwise).
    fn push_changes(&mut self, name: &str, value: Option<Value>, changes: Option<Vec<Change>>) {
        let Some(replicant) = self.replicants.get_mut(name) else {
            return;
        };
        replicant.set_suppressed(value);
        replicant.advance_revision();
        let revision_history = replicant.revision_history().to_vec();
        let value = replicant.value().cloned().unwrap_or(Value::Null);
        debug!(
            "replicant {name:?} advanced to revision {} (seq {})",
            &revision_history[0],
            replicant.sequence_number()
        );

        let event = match changes {
            Some(changes) => ServerEvent::Changed {
                name: name.to_owned(),
                revision_history,
                changes,
            },
            None => ServerEvent::Set {
                name: name.to_owned(),
                revision_history,
                value,
            },
        };
        let room = self.options.room_for(name);
        self.sink.multicast(&room, event);
    }

    fn ensure_replicant(&mut self, name: &str) -> &mut Replicant {
        self.replicants
            .entry(name.to_owned())
            .or_insert_with(|| Replicant::new(name))
    }
}
