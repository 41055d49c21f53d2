//! One handler per spec.md §4.4 request `type`, fanned out by [`dispatch`].
//!
//! Grounded on the teacher's per-route handlers (`src/routes/*.rs`): each
//! does decode → validate → authorize → mutate → shape reply/broadcast,
//! just over a persistent socket's `type` tag instead of an HTTP verb+path.

mod dms;
mod history;
mod init;
mod messages;
mod profile;
mod reactions;
mod rooms;
mod search;
mod users;

use std::sync::Mutex;

use serde_json::value::RawValue;

use crate::error::{AppError, AppResult};
use crate::hub::Hub;
use crate::protocol::HandlerOutcome;
use crate::store::Store;

/// Everything a handler needs: shared storage/broadcast handles plus the
/// authenticated principal for this connection. Borrowed for the duration
/// of a single dispatch call.
pub struct Ctx<'a> {
    pub store: &'a Store,
    pub hub: &'a Hub,
    pub user_id: &'a str,
    /// The room this connection is currently viewing, per spec.md §4.6 —
    /// handlers read it to decide whether a mutation affects the room the
    /// caller is looking at right now (e.g. `leave_room` resetting it when
    /// the left room was the current one).
    pub current_room: &'a Mutex<Option<String>>,
}

fn decode<'de, T: serde::Deserialize<'de>>(data: &'de RawValue) -> AppResult<T> {
    serde_json::from_str(data.get()).map_err(|e| AppError::Decode(e.to_string()))
}

/// Route one inbound envelope to its handler. Returns `Err(AppError)` where
/// `is_fatal()` is true for decode errors and storage errors that the
/// caller should treat as a connection teardown signal is never raised here
/// — only `Decode` is fatal at this layer; handlers translate storage
/// failures into non-fatal `error` envelopes themselves via `?` plus the
/// `AppError::Storage` variant, which `is_fatal()` reports `false` for.
pub async fn dispatch(ctx: &Ctx<'_>, kind: &str, data: &RawValue) -> AppResult<HandlerOutcome> {
    match kind {
        "init" => init::handle(ctx).await,
        "message" => messages::send(ctx, data).await,
        "edit_message" => messages::edit(ctx, data).await,
        "delete_message" => messages::delete(ctx, data).await,
        "add_reaction" => reactions::add(ctx, data).await,
        "remove_reaction" => reactions::remove(ctx, data).await,
        "history" => history::handle(ctx, data).await,
        "search" => search::handle(ctx, data).await,
        "get_message_context" => messages::get_context(ctx, data).await,
        "join_room" => rooms::join(ctx, data).await,
        "leave_room" => rooms::leave(ctx, data).await,
        "create_room" => rooms::create(ctx, data).await,
        "create_dm" => dms::create(ctx, data).await,
        "list_rooms" => rooms::list(ctx, data).await,
        "room_info" => rooms::info(ctx, data).await,
        "list_users" => users::list(ctx, data).await,
        "get_profile" => profile::get(ctx).await,
        "update_profile" => profile::update(ctx, data).await,
        other => Err(AppError::Decode(format!("unknown envelope type '{other}'"))),
    }
}
