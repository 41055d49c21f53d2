//! `init` — spec.md §4.4: snapshot the caller's user record, channels, DMs,
//! and resolved current room, sent once right after the socket upgrades.

use crate::auth;
use crate::entities::{membership, room, user};
use crate::error::{AppError, AppResult};
use crate::protocol::responses::{DmSummary, InitReply, RoomSummary};
use crate::protocol::{HandlerOutcome, OutboundEnvelope};

use super::Ctx;

pub async fn handle(ctx: &Ctx<'_>) -> AppResult<HandlerOutcome> {
    let me = user::by_id(ctx.store, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let channel_ids = membership::room_ids_for_user(ctx.store, ctx.user_id, "channel").await?;
    let mut rooms = Vec::with_capacity(channel_ids.len());
    for room_id in &channel_ids {
        if let Some(r) = room::by_id(ctx.store, room_id).await? {
            rooms.push(RoomSummary { room: r, is_member: true });
        }
    }

    let dm_ids = membership::room_ids_for_user(ctx.store, ctx.user_id, "dm").await?;
    let mut dms = Vec::with_capacity(dm_ids.len());
    for room_id in &dm_ids {
        if let Some(r) = room::by_id(ctx.store, room_id).await? {
            let member_ids = membership::member_user_ids(ctx.store, room_id).await?;
            let members = user::by_ids(ctx.store, &member_ids).await?;
            dms.push(DmSummary { room: r, members });
        }
    }

    // Resolve current_room: last_room if the user is still a member,
    // otherwise the default room (spec.md §4.4's `init` row).
    let current_room = match &me.last_room_id {
        Some(room_id) if auth::is_room_member(ctx.store, ctx.user_id, room_id).await? => {
            room::by_id(ctx.store, room_id).await?
        }
        _ => room::default_room(ctx.store).await?,
    };
    let current_room_id = current_room.as_ref().map(|r| r.id.clone());

    let reply = OutboundEnvelope::new(
        "init",
        InitReply { user: me, rooms, dms, current_room },
    );
    Ok(HandlerOutcome::reply_only(reply).with_current_room(current_room_id))
}
