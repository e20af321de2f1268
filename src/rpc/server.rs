//! Client session loop.
//!
//! One [`Server::poll`] call per scheduling tick walks every pre-allocated
//! slot in order:
//!
//! ```text
//!            accept_next()                 is_connected() == true
//!  ┌──────────────┐ ─────────────▶ (conn) ─────────────────────▶ ┌───────────┐
//!  │ Disconnected │                          on_connect()        │ Connected │
//!  └──────────────┘ ◀─────────────────────────────────────────── └───────────┘
//!         ▲            is_connected() == false / on_disconnect()      │
//!         └── accept attempted in the same tick ◀────────────────────┘
//! ```
//!
//! A connected slot reads what is available, decodes at most one message
//! and dispatches it.  That one-message cap is the only backpressure.  A
//! partial message that receives no bytes for [`STALE_FRAME_TICKS`] ticks
//! is dispatched as-is, so the client gets a parse error and the slot
//! keeps serving.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::property::ChangeQueue;

use super::codec::{MAX_MESSAGE_SIZE, MessageDecoder, encode_message};
use super::dispatch::dispatch_bytes;
use super::registry::Registry;
use super::transport::{Connection, Listener};

/// Idle ticks after which a partial message is flushed to the dispatcher.
pub const STALE_FRAME_TICKS: u16 = 50;

/// Client identifier — index into the slot table.
pub type ClientId = u8;

/// Lifecycle state of one client slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Disconnected,
    Connected,
}

/// Connect / disconnect callbacks, implemented by the application context.
pub trait SessionHooks {
    /// Runs exactly once when a slot enters `Connected`.
    fn on_connect(&mut self, client: ClientId) {
        info!("RPC[{}]: client connected", client);
    }

    /// Runs exactly once when a slot leaves `Connected`.
    fn on_disconnect(&mut self, client: ClientId) {
        info!("RPC[{}]: client disconnected", client);
    }
}

/// Counters for diagnostics.  All counters wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub messages_dispatched: u32,
    pub responses_sent: u32,
    pub notifications_dropped: u32,
    pub framing_overflows: u32,
    pub broadcasts: u32,
}

struct ClientSlot<S> {
    conn: Option<S>,
    state: SlotState,
    decoder: MessageDecoder,
    idle_ticks: u16,
}

impl<S> ClientSlot<S> {
    fn new() -> Self {
        Self {
            conn: None,
            state: SlotState::Disconnected,
            decoder: MessageDecoder::new(),
            idle_ticks: 0,
        }
    }
}

/// Session loop over a fixed slot table and a read-only method registry.
pub struct Server<L: Listener, C> {
    registry: Registry<C>,
    slots: Vec<ClientSlot<L::Connection>>,
    listener: L,
    stats: SessionStats,
}

impl<L: Listener, C> Server<L, C> {
    /// Validate `config`, allocate the registry and slot table once, and
    /// run the bulk-registration hook.
    pub fn setup(
        config: &ServerConfig,
        listener: L,
        register: impl FnOnce(&mut Registry<C>) -> Result<()>,
    ) -> Result<Self> {
        config.validate()?;

        let mut registry = Registry::with_capacity(config.max_methods);
        register(&mut registry)?;

        let slots = (0..config.max_clients).map(|_| ClientSlot::new()).collect();

        info!(
            "RPC: setup complete ({}/{} methods, {} client slots)",
            registry.len(),
            registry.capacity(),
            config.max_clients
        );

        Ok(Self {
            registry,
            slots,
            listener,
            stats: SessionStats::default(),
        })
    }

    /// One scheduling tick.
    pub fn poll(&mut self, ctx: &mut C)
    where
        C: SessionHooks,
    {
        let Self {
            registry,
            slots,
            listener,
            stats,
        } = self;

        for (idx, slot) in slots.iter_mut().enumerate() {
            let client = idx as ClientId;
            let connected = slot.conn.as_mut().is_some_and(|c| c.is_connected());

            match (slot.state, connected) {
                (SlotState::Disconnected, true) => {
                    slot.state = SlotState::Connected;
                    slot.decoder.reset();
                    slot.idle_ticks = 0;
                    ctx.on_connect(client);
                }
                (SlotState::Connected, false) => {
                    slot.state = SlotState::Disconnected;
                    slot.conn = None;
                    slot.decoder.reset();
                    slot.idle_ticks = 0;
                    ctx.on_disconnect(client);
                }
                _ => {}
            }

            match slot.state {
                SlotState::Connected => service_slot(registry, ctx, stats, client, slot),
                SlotState::Disconnected => {
                    if let Some(conn) = listener.accept_next() {
                        debug!("RPC[{}]: accepted connection", client);
                        slot.conn = Some(conn);
                    }
                }
            }
        }
    }

    /// Send one document to every connected slot, in slot order.
    /// Returns the number of slots it was delivered to.
    pub fn broadcast<D: Serialize + ?Sized>(&mut self, document: &D) -> usize {
        let bytes = match encode_message(document) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("RPC: broadcast not serializable: {}", e);
                return 0;
            }
        };

        bump(&mut self.stats.broadcasts);
        let mut delivered = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.state != SlotState::Connected {
                continue;
            }
            if let Some(conn) = slot.conn.as_mut() {
                if send_bytes(conn, idx as ClientId, &bytes) {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Send one document to a single connected slot.
    pub fn notify_client<D: Serialize + ?Sized>(&mut self, client: ClientId, document: &D) -> bool {
        let Some(slot) = self.slots.get_mut(client as usize) else {
            warn!("RPC[{}]: no such slot", client);
            return false;
        };
        if slot.state != SlotState::Connected {
            return false;
        }
        let Some(conn) = slot.conn.as_mut() else {
            return false;
        };
        match encode_message(document) {
            Ok(bytes) => send_bytes(conn, client, &bytes),
            Err(e) => {
                warn!("RPC[{}]: document not serializable: {}", client, e);
                false
            }
        }
    }

    /// Drain `queue` and broadcast every pending change.  Returns the
    /// number of changes drained.
    pub fn flush_changes<T, const N: usize>(&mut self, queue: &ChangeQueue<T, N>) -> usize
    where
        T: Clone + Serialize,
    {
        let mut drained = 0;
        while let Some(change) = queue.try_next() {
            self.broadcast(&change);
            drained += 1;
        }
        drained
    }

    pub fn slot_state(&self, client: ClientId) -> Option<SlotState> {
        self.slots.get(client as usize).map(|s| s.state)
    }

    pub fn connected_clients(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Connected)
            .count()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }
}

fn service_slot<S: Connection, C>(
    registry: &Registry<C>,
    ctx: &mut C,
    stats: &mut SessionStats,
    client: ClientId,
    slot: &mut ClientSlot<S>,
) {
    let Some(conn) = slot.conn.as_mut() else {
        return;
    };

    let mut received = 0;
    let want = conn.bytes_available().min(slot.decoder.spare_capacity());
    if want > 0 {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        match conn.read(&mut buf[..want]) {
            Ok(n) => {
                received = n;
                if slot.decoder.push(&buf[..n]).is_err() {
                    warn!("RPC[{}]: message exceeds {} bytes, discarded", client, MAX_MESSAGE_SIZE);
                    bump(&mut stats.framing_overflows);
                }
            }
            Err(e) => warn!("RPC[{}]: read error: {:?}", client, e),
        }
    }

    let message = match slot.decoder.next_message() {
        Some(message) => {
            slot.idle_ticks = 0;
            message
        }
        None if slot.decoder.is_stalled() => {
            warn!("RPC[{}]: no complete message in {} bytes, discarded", client, MAX_MESSAGE_SIZE);
            slot.decoder.reset();
            slot.idle_ticks = 0;
            bump(&mut stats.framing_overflows);
            return;
        }
        None => {
            if received > 0 || slot.decoder.buffered() == 0 {
                slot.idle_ticks = 0;
                return;
            }
            slot.idle_ticks += 1;
            if slot.idle_ticks < STALE_FRAME_TICKS {
                return;
            }
            slot.idle_ticks = 0;
            let Some(partial) = slot.decoder.take_pending() else {
                return;
            };
            warn!("RPC[{}]: incomplete message stalled for {} ticks, flushed", client, STALE_FRAME_TICKS);
            partial
        }
    };

    debug!("RPC[{}]: <- {} bytes", client, message.len());
    bump(&mut stats.messages_dispatched);

    let Some(response) = dispatch_bytes(registry, ctx, &message) else {
        bump(&mut stats.notifications_dropped);
        return;
    };

    match encode_message(&response) {
        Ok(bytes) => {
            if send_bytes(conn, client, &bytes) {
                bump(&mut stats.responses_sent);
            }
        }
        Err(e) => warn!("RPC[{}]: response not serializable: {}", client, e),
    }
}

fn bump(counter: &mut u32) {
    *counter = counter.wrapping_add(1);
}

fn send_bytes<S: Connection>(conn: &mut S, client: ClientId, bytes: &[u8]) -> bool {
    match conn.send(bytes) {
        Ok(()) => true,
        Err(e) => {
            warn!("RPC[{}]: write failed: {:?}", client, e);
            false
        }
    }
}
