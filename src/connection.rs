//! Per-socket read pump and write pump (spec.md §4.6).
//!
//! Grounded on `routes/stream.rs`'s `tokio::select!` loop (ping-equivalent
//! heartbeat ticker racing a channel receive) for the write side; the read
//! side has no teacher precedent (SSE is one-directional) and is built
//! straight from spec.md §4.6's pump description using `axum`'s `ws`
//! feature, the pack's only chat server that actually speaks WebSocket
//! (`berrym-lair-chat`).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::value::RawValue;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::Config;
use crate::handlers::{self, Ctx};
use crate::hub::{next_connection_id, ConnHandle, Hub};
use crate::protocol::{HandlerOutcome, InboundEnvelope, OutboundEnvelope};
use crate::store::Store;

/// Runs both pumps for one upgraded socket to completion. Registers with
/// the hub on entry and unregisters on exit no matter which pump exits
/// first (spec.md §4.6's lifecycle rule).
pub async fn handle_socket(socket: WebSocket, store: Arc<Store>, hub: Hub, config: Arc<Config>, user_id: String) {
    let conn_id = next_connection_id();
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(config.outbound_capacity);
    let current_room: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    // The hub's `ConnHandle` holds the only `Sender` for this channel — the
    // read pump below never keeps its own clone, it reaches the same queue
    // through `hub.unicast(conn_id, ...)` instead. That way stalled-peer
    // eviction (the hub dropping this sender) actually closes the channel
    // and makes the write pump's `outbound_rx.recv() == None` branch fire,
    // tearing the connection down instead of leaving it dangling until a
    // read/write timeout (spec.md §4.5, §4.6).
    hub.register(ConnHandle {
        id: conn_id,
        user_id: user_id.clone(),
        outbound: outbound_tx,
        current_room: current_room.clone(),
    });

    let write_wait = Duration::from_secs(config.write_wait_secs);
    let ping_period = Duration::from_secs(config.ping_period_secs());
    let write_task = tokio::spawn(async move {
        let mut ticker = interval(ping_period);
        ticker.tick().await; // first tick fires immediately; discard it

        loop {
            tokio::select! {
                frame = outbound_rx.recv() => {
                    let Some(first) = frame else {
                        let _ = tokio::time::timeout(write_wait, ws_sink.send(WsMessage::Close(None))).await;
                        break;
                    };
                    // Drain any additional queued frames and coalesce them
                    // into one transport message, newline-separated
                    // (spec.md §4.6).
                    let mut batch = first;
                    while let Ok(next) = outbound_rx.try_recv() {
                        batch.push('\n');
                        batch.push_str(&next);
                    }
                    if tokio::time::timeout(write_wait, ws_sink.send(WsMessage::Text(batch.into()))).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if tokio::time::timeout(write_wait, ws_sink.send(WsMessage::Ping(Vec::new().into()))).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let pong_wait = Duration::from_secs(config.pong_wait_secs);
    read_pump(
        &mut ws_stream,
        &store,
        &hub,
        &user_id,
        conn_id,
        &current_room,
        pong_wait,
        config.ws_max_frame_bytes,
    )
    .await;

    hub.unregister(conn_id);
    write_task.abort();
    info!(conn_id, user_id = %user_id, "connection closed");
}

#[allow(clippy::too_many_arguments)]
async fn read_pump(
    ws_stream: &mut (impl StreamExt<Item = Result<WsMessage, axum::Error>> + Unpin),
    store: &Arc<Store>,
    hub: &Hub,
    user_id: &str,
    conn_id: u64,
    current_room: &Arc<Mutex<Option<String>>>,
    pong_wait: Duration,
    max_frame_bytes: usize,
) {
    let ctx = Ctx { store, hub, user_id, current_room: current_room.as_ref() };

    loop {
        let next = match tokio::time::timeout(pong_wait, ws_stream.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                warn!(user_id, error = %e, "socket read error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                warn!(user_id, "pong wait exceeded, closing connection");
                break;
            }
        };

        match next {
            WsMessage::Text(text) => {
                if text.len() > max_frame_bytes {
                    warn!(user_id, size = text.len(), max_frame_bytes, "frame exceeds max size, closing");
                    break;
                }
                if !handle_frame(&ctx, &text, conn_id, current_room).await {
                    break;
                }
            }
            // Read deadline is refreshed implicitly by the next `timeout`
            // call around `ws_stream.next()`; no separate extension needed.
            WsMessage::Pong(_) => {}
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Binary(_) => {}
        }
    }
}

/// Decodes and dispatches one frame. Returns `false` if the connection
/// should be torn down (decode errors are a protocol violation from a
/// trusted authenticated session, per spec.md §7).
async fn handle_frame(
    ctx: &Ctx<'_>,
    text: &str,
    conn_id: u64,
    current_room: &Arc<Mutex<Option<String>>>,
) -> bool {
    let envelope: InboundEnvelope = match serde_json::from_str(text) {
        Ok(env) => env,
        Err(e) => {
            warn!(user_id = ctx.user_id, error = %e, "malformed envelope, closing connection");
            return false;
        }
    };

    route(ctx, &envelope.kind, &envelope.data, conn_id, current_room).await
}

async fn route(
    ctx: &Ctx<'_>,
    kind: &str,
    data: &RawValue,
    conn_id: u64,
    current_room: &Arc<Mutex<Option<String>>>,
) -> bool {
    match handlers::dispatch(ctx, kind, data).await {
        Ok(outcome) => {
            apply_outcome(ctx, outcome, conn_id, current_room);
            true
        }
        Err(err) if err.is_fatal() => {
            warn!(user_id = ctx.user_id, %kind, error = %err, "fatal protocol error, closing connection");
            false
        }
        Err(err) => {
            if matches!(err, crate::error::AppError::Storage(_)) {
                warn!(user_id = ctx.user_id, %kind, error = %err, "storage error handling request");
            } else {
                warn!(user_id = ctx.user_id, %kind, error = %err, "request rejected");
            }
            let frame = OutboundEnvelope::error(err.wire_message()).to_frame_text();
            ctx.hub.unicast(conn_id, frame);
            true
        }
    }
}

fn apply_outcome(ctx: &Ctx<'_>, outcome: HandlerOutcome, conn_id: u64, current_room: &Arc<Mutex<Option<String>>>) {
    if let Some(new_room) = outcome.set_current_room {
        *current_room.lock().unwrap() = new_room;
    }
    if let Some(reply) = &outcome.reply {
        ctx.hub.unicast(conn_id, reply.to_frame_text());
    }
    if let Some((room_id, broadcast)) = &outcome.broadcast {
        // The originator is not unicast the broadcast separately — it
        // receives it through the hub's normal room-scoped fan-out iff its
        // `current_room` already equals `room_id` (spec.md §4.4's routing
        // note), which `apply_outcome` just updated above when applicable.
        ctx.hub.broadcast(room_id.clone(), broadcast.to_frame_text());
    }
}
