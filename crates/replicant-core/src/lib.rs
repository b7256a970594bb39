//! replicant-core — named replicated JSON values over a message channel.
//!
//! A *replicant* is a named structured value shared between one authoritative
//! server and any number of mirror clients. Clients register for a value by
//! name, observe and mutate it locally, and forward edits as structured
//! change-lists; the server validates each edit against a revision-history
//! hash chain, persists the canonical revision in memory, and multicasts
//! accepted updates to every subscriber of that name. Divergent clients are
//! recovered by re-synchronization against the server (their local edit is
//! discarded, not merged).
//!
//! The message transport is out of scope: the replicators speak through the
//! [`wire`] message types and the [`server::RoomSink`] / [`client::ClientSink`]
//! seams, and assume a duplex, in-order, message-oriented channel with
//! server-side room multicast.

pub mod change;
pub mod client;
pub mod observe;
pub mod options;
pub mod replicant;
pub mod revision;
pub mod server;
pub mod value_path;
pub mod wire;

pub use change::{apply_changes, reverse_changes, Change};
pub use client::{ClientReplicator, ClientSink, ReplicantError};
pub use observe::{diff_transition, format_changes, DeepObserver, RawChange, RawChangeKind};
pub use options::ReplicatorOptions;
pub use replicant::Replicant;
pub use revision::{revision_label, MAX_REVISION_HISTORY};
pub use server::{RoomSink, ServerReplicator, SocketId};
pub use wire::{ClientMessage, ServerEvent, ServerReply, WireError};
