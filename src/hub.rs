//! Connection registry and room-scoped broadcast delivery (spec.md §4.5).
//!
//! Generalizes the teacher's `EventBus` (`src/events.rs`, a single
//! `tokio::sync::broadcast` that every SSE subscriber filters for itself in
//! `routes/stream.rs`) into an explicit per-connection `mpsc` plus one task
//! that owns the live-connection set and does the room filtering centrally.
//! A `broadcast::Sender` can't give a concrete backpressure policy — lagging
//! receivers just silently drop old events — so it doesn't fit spec.md §5's
//! requirement that a full outbound buffer evict the stalled peer instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_connection_id() -> u64 {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Shared per-connection state the hub needs to know about. Everything
/// else (the socket, the read/write tasks) stays private to
/// `crate::connection`.
pub struct ConnHandle {
    pub id: u64,
    pub user_id: String,
    pub outbound: mpsc::Sender<String>,
    /// Mutated exclusively by that connection's read pump (spec.md §4.6);
    /// the hub only ever reads it.
    pub current_room: Arc<Mutex<Option<String>>>,
}

enum HubMessage {
    Register(ConnHandle),
    Unregister(u64),
    Broadcast { room_id: String, frame: String },
    Unicast { conn_id: u64, frame: String },
}

/// Cloneable handle used by connections and dispatch to talk to the hub
/// task. The hub task itself is the only thing that touches the connection
/// set (spec.md §4.5's concurrency invariant).
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::UnboundedSender<HubMessage>,
}

impl Hub {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self { tx }
    }

    pub fn register(&self, handle: ConnHandle) {
        let _ = self.tx.send(HubMessage::Register(handle));
    }

    pub fn unregister(&self, id: u64) {
        let _ = self.tx.send(HubMessage::Unregister(id));
    }

    pub fn broadcast(&self, room_id: impl Into<String>, frame: impl Into<String>) {
        let _ = self.tx.send(HubMessage::Broadcast {
            room_id: room_id.into(),
            frame: frame.into(),
        });
    }

    /// Enqueues a unicast reply to exactly one connection. The read pump
    /// uses this instead of holding its own clone of the outbound
    /// `Sender` so that the hub's `ConnHandle` is the *only* long-lived
    /// sender on the channel — eviction (closing that one sender) is then
    /// sufficient to make `outbound_rx.recv()` return `None` and tear the
    /// connection's write pump down (spec.md §4.5, §4.6).
    pub fn unicast(&self, conn_id: u64, frame: impl Into<String>) {
        let _ = self.tx.send(HubMessage::Unicast {
            conn_id,
            frame: frame.into(),
        });
    }
}

/// Non-blocking enqueue onto `handle`'s outbound channel. Returns `true` if
/// the send failed because the buffer is full — the caller evicts the
/// connection in that case (spec.md §4.5's stalled-peer policy).
fn try_deliver(handle: &ConnHandle, frame: &str) -> bool {
    handle.outbound.try_send(frame.to_string()).is_err()
}

async fn run(mut rx: mpsc::UnboundedReceiver<HubMessage>) {
    let mut connections: HashMap<u64, ConnHandle> = HashMap::new();

    while let Some(msg) = rx.recv().await {
        match msg {
            HubMessage::Register(handle) => {
                debug!(conn_id = handle.id, user_id = %handle.user_id, "connection registered");
                connections.insert(handle.id, handle);
            }
            HubMessage::Unregister(id) => {
                if let Some(handle) = connections.remove(&id) {
                    drop(handle.outbound);
                    debug!(conn_id = id, "connection unregistered");
                }
            }
            HubMessage::Broadcast { room_id, frame } => {
                let mut stalled = Vec::new();
                for (id, handle) in connections.iter() {
                    let current = handle.current_room.lock().unwrap().clone();
                    if current.as_deref() != Some(room_id.as_str()) {
                        continue;
                    }
                    if try_deliver(handle, &frame) {
                        stalled.push(*id);
                    }
                }
                for id in stalled {
                    if let Some(handle) = connections.remove(&id) {
                        warn!(conn_id = id, "evicting stalled connection: outbound buffer full");
                        drop(handle.outbound);
                    }
                }
            }
            HubMessage::Unicast { conn_id, frame } => {
                let stalled = match connections.get(&conn_id) {
                    Some(handle) => try_deliver(handle, &frame),
                    None => false,
                };
                if stalled {
                    if let Some(handle) = connections.remove(&conn_id) {
                        warn!(conn_id, "evicting stalled connection: outbound buffer full");
                        drop(handle.outbound);
                    }
                }
            }
        }
    }
}
