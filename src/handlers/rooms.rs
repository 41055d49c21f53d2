//! `join_room`, `leave_room`, `create_room`, `list_rooms`, `room_info`
//! (spec.md §4.4).

use rusqlite::ErrorCode;

use crate::auth;
use crate::entities::{membership, room, user};
use crate::error::{AppError, AppResult};
use crate::ids;
use crate::protocol::requests::{CreateRoomRequest, JoinRoomRequest, LeaveRoomRequest, ListRoomsRequest, RoomInfoRequest};
use crate::protocol::responses::{CreateRoomReply, JoinRoomReply, LeaveRoomReply, ListRoomsReply, RoomInfoReply, RoomSummary};
use crate::protocol::{HandlerOutcome, OutboundEnvelope};
use crate::time;

use super::{decode, Ctx};

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

pub async fn join(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: JoinRoomRequest = decode(data)?;
    let target = room::by_id(ctx.store, &req.room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("room not found".to_string()))?;

    let already_member = auth::is_room_member(ctx.store, ctx.user_id, &target.id).await?;
    if !already_member && target.is_private {
        return Err(AppError::Authorization("cannot join a private room without an invitation".to_string()));
    }

    let now = time::now();
    if !already_member {
        let user_id = ctx.user_id.to_string();
        let room_id = target.id.clone();
        ctx.store.with_write_txn(|conn| -> Result<(), AppError> {
            membership::insert(conn, &user_id, &room_id)?;
            Ok(())
        })?;
    }
    user::set_last_room(ctx.store, ctx.user_id, &target.id, &now)?;

    let room_id = target.id.clone();
    let reply = OutboundEnvelope::new("join_room", JoinRoomReply { room: target, joined: !already_member });
    Ok(HandlerOutcome::reply_only(reply).with_current_room(Some(room_id)))
}

pub async fn leave(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: LeaveRoomRequest = decode(data)?;
    let target = room::by_id(ctx.store, &req.room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("room not found".to_string()))?;

    if !auth::is_room_member(ctx.store, ctx.user_id, &target.id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }
    if auth::is_default_room(ctx.store, &target.id).await? {
        return Err(AppError::Validation("cannot leave the default room".to_string()));
    }
    if target.room_type == room::RoomType::Dm {
        let count = auth::dm_member_count(ctx.store, &target.id).await?;
        if count <= 2 {
            return Err(AppError::Validation("cannot leave a direct message with only two members".to_string()));
        }
    }

    membership::delete(ctx.store, ctx.user_id, &target.id)?;

    let was_current = ctx.current_room.lock().unwrap().as_deref() == Some(target.id.as_str());
    let reply = OutboundEnvelope::new("leave_room", LeaveRoomReply { room_id: target.id });
    let mut outcome = HandlerOutcome::reply_only(reply);
    if was_current {
        let fallback = room::default_room(ctx.store).await?;
        outcome = outcome.with_current_room(fallback.map(|r| r.id));
    }
    Ok(outcome)
}

pub async fn create(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: CreateRoomRequest = decode(data)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("room name must not be empty".to_string()));
    }
    if name.chars().count() > 80 {
        return Err(AppError::Validation("room name must be at most 80 characters".to_string()));
    }
    if room::by_name(ctx.store, name).await?.is_some() {
        return Err(AppError::Conflict("room name is already taken".to_string()));
    }

    let id = ids::room_id();
    let now = time::now();
    let name_owned = name.to_string();
    let user_id = ctx.user_id.to_string();
    let is_private = req.is_private;
    let result = ctx.store.with_write_txn(|conn| -> Result<(), AppError> {
        room::insert_channel(conn, &id, &name_owned, is_private, &now)?;
        membership::insert(conn, &user_id, &id)?;
        Ok(())
    });

    if let Err(err) = &result {
        if let AppError::Storage(e) = err {
            if is_unique_violation(e) {
                return Err(AppError::Conflict("room name is already taken".to_string()));
            }
        }
    }
    result?;

    user::set_last_room(ctx.store, ctx.user_id, &id, &now)?;
    let created = room::by_id(ctx.store, &id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;

    let room_id = created.id.clone();
    let reply = OutboundEnvelope::new("create_room", CreateRoomReply { room: created });
    Ok(HandlerOutcome::reply_only(reply).with_current_room(Some(room_id)))
}

pub async fn list(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: ListRoomsRequest = decode(data)?;
    let found = room::public_rooms(ctx.store, req.query.as_deref()).await?;

    let mut rooms = Vec::with_capacity(found.len());
    for r in found {
        let is_member = auth::is_room_member(ctx.store, ctx.user_id, &r.id).await?;
        rooms.push(RoomSummary { room: r, is_member });
    }

    let reply = OutboundEnvelope::new("list_rooms", ListRoomsReply { rooms });
    Ok(HandlerOutcome::reply_only(reply))
}

pub async fn info(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: RoomInfoRequest = decode(data)?;
    if !auth::is_room_member(ctx.store, ctx.user_id, &req.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }
    let target = room::by_id(ctx.store, &req.room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("room not found".to_string()))?;

    let member_ids = membership::member_user_ids(ctx.store, &target.id).await?;
    let members = user::by_ids(ctx.store, &member_ids).await?;
    let member_count = members.len() as i64;

    let reply = OutboundEnvelope::new("room_info", RoomInfoReply { room: target, members, member_count });
    Ok(HandlerOutcome::reply_only(reply))
}
