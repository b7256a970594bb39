//! In-memory transport hub for integration tests.
//!
//! Wires one server replicator to N client replicators with FIFO message
//! queues and room-multicast delivery. Every message, acknowledgement and
//! multicast is round-tripped through the positional wire codec, so the
//! suites exercise the same encoding a real transport would carry.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use replicant_core::{
    ClientMessage, ClientReplicator, ClientSink, ReplicatorOptions, RoomSink, ServerEvent,
    ServerReplicator, ServerReply, SocketId,
};

// ── Transport fakes ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct Bus {
    namespace: Option<String>,
    rooms: BTreeMap<String, Vec<SocketId>>,
    multicasts: Vec<(String, ServerEvent)>,
}

/// Server-side sink backed by the shared bus.
pub struct SharedBus(Rc<RefCell<Bus>>);

impl RoomSink for SharedBus {
    fn select_namespace(&mut self, namespace: &str) {
        self.0.borrow_mut().namespace = Some(namespace.to_owned());
    }

    fn join(&mut self, socket: SocketId, room: &str) {
        let mut bus = self.0.borrow_mut();
        let members = bus.rooms.entry(room.to_owned()).or_default();
        if !members.contains(&socket) {
            members.push(socket);
        }
    }

    fn multicast(&mut self, room: &str, event: ServerEvent) {
        self.0.borrow_mut().multicasts.push((room.to_owned(), event));
    }
}

/// Client-side sink: an outbox drained by the hub pump.
#[derive(Default, Clone)]
pub struct SharedOutbox(Rc<RefCell<VecDeque<ClientMessage>>>);

impl ClientSink for SharedOutbox {
    fn emit(&mut self, message: ClientMessage) {
        self.0.borrow_mut().push_back(message);
    }
}

// ── Hub ───────────────────────────────────────────────────────────────────

pub struct ClientEnd {
    pub replicator: ClientReplicator<SharedOutbox>,
    outbox: SharedOutbox,
    socket: SocketId,
}

pub struct Hub {
    pub server: ServerReplicator<SharedBus>,
    bus: Rc<RefCell<Bus>>,
    clients: Vec<ClientEnd>,
    /// Every client→server message, in delivery order.
    pub sent: Vec<(SocketId, ClientMessage)>,
    /// Every multicast delivery, per receiving socket, in delivery order.
    pub delivered: Vec<(SocketId, ServerEvent)>,
}

impl Hub {
    pub fn new(client_count: usize) -> Self {
        let bus = Rc::new(RefCell::new(Bus::default()));
        let server = ServerReplicator::new(SharedBus(Rc::clone(&bus)), ReplicatorOptions::default());
        // Default options never select a sub-channel.
        assert!(bus.borrow().namespace.is_none());
        let clients = (0..client_count)
            .map(|i| {
                let outbox = SharedOutbox::default();
                ClientEnd {
                    replicator: ClientReplicator::new(
                        outbox.clone(),
                        ReplicatorOptions::default(),
                    ),
                    outbox,
                    socket: SocketId(i as u64 + 1),
                }
            })
            .collect();
        Hub {
            server,
            bus,
            clients,
            sent: Vec::new(),
            delivered: Vec::new(),
        }
    }

    pub fn client(&mut self, index: usize) -> &mut ClientReplicator<SharedOutbox> {
        &mut self.clients[index].replicator
    }

    /// Read-only view of a client, usable alongside server borrows.
    pub fn client_ref(&self, index: usize) -> &ClientReplicator<SharedOutbox> {
        &self.clients[index].replicator
    }

    /// Delivers queued messages until the network is quiescent.
    pub fn pump(&mut self) {
        loop {
            let Some((index, message)) = self.next_outbound() else {
                break;
            };
            self.deliver(index, message);
        }
    }

    fn next_outbound(&mut self) -> Option<(usize, ClientMessage)> {
        for (index, client) in self.clients.iter().enumerate() {
            let popped = client.outbox.0.borrow_mut().pop_front();
            if let Some(message) = popped {
                return Some((index, message));
            }
        }
        None
    }

    fn deliver(&mut self, index: usize, message: ClientMessage) {
        let socket = self.clients[index].socket;

        // Round-trip through the positional wire form.
        let (name, args) = message.encode();
        let decoded = ClientMessage::decode(name, &args)
            .unwrap_or_else(|e| panic!("client message failed to decode: {e}"));
        self.sent.push((socket, decoded.clone()));

        let reply = self.server.handle_message(socket, decoded);
        // The multicast goes out inside the handler; deliver it before the
        // acknowledgement (the originator must tolerate either order).
        self.flush_multicasts();

        let reply_args = reply.encode();
        let reply = ServerReply::decode(name, &reply_args)
            .unwrap_or_else(|e| panic!("acknowledgement failed to decode: {e}"));
        self.clients[index].replicator.handle_reply(reply);
    }

    fn flush_multicasts(&mut self) {
        loop {
            let queued: Vec<(String, ServerEvent)> =
                self.bus.borrow_mut().multicasts.drain(..).collect();
            if queued.is_empty() {
                break;
            }
            for (room, event) in queued {
                let members = self
                    .bus
                    .borrow()
                    .rooms
                    .get(&room)
                    .cloned()
                    .unwrap_or_default();
                let (name, args) = event.encode();
                for socket in members {
                    let decoded = ServerEvent::decode(name, &args)
                        .unwrap_or_else(|e| panic!("multicast failed to decode: {e}"));
                    self.delivered.push((socket, decoded.clone()));
                    if let Some(client) =
                        self.clients.iter_mut().find(|c| c.socket == socket)
                    {
                        client.replicator.handle_event(decoded);
                    }
                }
            }
        }
    }

    /// Client→server messages of a given wire name for one replicant.
    pub fn sent_named(&self, message_name: &str, replicant: &str) -> Vec<&ClientMessage> {
        self.sent
            .iter()
            .map(|(_, m)| m)
            .filter(|m| m.message_name() == message_name && m.name() == replicant)
            .collect()
    }

    /// Multicasts delivered to one socket for one replicant.
    pub fn delivered_to(&self, socket: SocketId, replicant: &str) -> Vec<&ServerEvent> {
        self.delivered
            .iter()
            .filter(|(s, e)| *s == socket && e.name() == replicant)
            .map(|(_, e)| e)
            .collect()
    }

    pub fn socket_of(&self, index: usize) -> SocketId {
        self.clients[index].socket
    }
}

/// Registers `name` on the given clients and pumps until they are ready.
pub fn register_all(hub: &mut Hub, name: &str, clients: &[usize]) {
    for &index in clients {
        hub.client(index).get_replicant(name);
    }
    hub.pump();
    for &index in clients {
        assert!(hub.client(index).is_ready(name), "client {index} not ready");
    }
}
