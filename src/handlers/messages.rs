//! `message`, `edit_message`, `delete_message`, `get_message_context`
//! (spec.md §4.4).

use crate::auth;
use crate::entities::{message, room};
use crate::error::{AppError, AppResult};
use crate::ids;
use crate::protocol::requests::{DeleteMessageRequest, EditMessageRequest, GetMessageContextRequest, SendMessageRequest};
use crate::protocol::responses::{GetMessageContextReply, MessageDeletedBroadcast, MessageEditedBroadcast, MessageReply};
use crate::protocol::{HandlerOutcome, OutboundEnvelope};
use crate::time;

use super::{decode, Ctx};

pub async fn send(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: SendMessageRequest = decode(data)?;
    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("message body must not be empty".to_string()));
    }
    if !auth::is_room_member(ctx.store, ctx.user_id, &req.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    let id = ids::message_id();
    let now = time::now();
    let room_id = req.room_id.clone();
    let user_id = ctx.user_id.to_string();
    let body_owned = body.to_string();
    ctx.store.with_write_txn(|conn| -> Result<(), AppError> {
        message::insert(conn, &id, &room_id, &user_id, &body_owned, &now)?;
        room::touch_last_message(conn, &room_id, &now)?;
        Ok(())
    })?;

    let saved = message::by_id(ctx.store, &id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;

    let reply = OutboundEnvelope::new("message", MessageReply { message: saved.clone() });
    let broadcast = OutboundEnvelope::new("message", MessageReply { message: saved });
    Ok(HandlerOutcome::reply_and_broadcast(reply, req.room_id, broadcast))
}

pub async fn edit(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: EditMessageRequest = decode(data)?;
    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("message body must not be empty".to_string()));
    }

    let existing = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
    if !auth::is_message_owner(ctx.store, ctx.user_id, &existing.id).await? {
        return Err(AppError::Authorization("only the author can edit this message".to_string()));
    }
    if existing.deleted_at.is_some() {
        return Err(AppError::Validation("cannot edit a deleted message".to_string()));
    }
    if !auth::is_room_member(ctx.store, ctx.user_id, &existing.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    let now = time::now();
    message::edit(ctx.store, &req.message_id, body, &now)?;
    let updated = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;

    let broadcast = OutboundEnvelope::new("message_edited", MessageEditedBroadcast { message: updated.clone() });
    Ok(HandlerOutcome::broadcast_only(updated.room_id, broadcast))
}

pub async fn delete(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: DeleteMessageRequest = decode(data)?;

    let existing = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
    if !auth::is_message_owner(ctx.store, ctx.user_id, &existing.id).await? {
        return Err(AppError::Authorization("only the author can delete this message".to_string()));
    }
    if !auth::is_room_member(ctx.store, ctx.user_id, &existing.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    // Idempotent: deleting an already-deleted message is a no-op that still
    // reports the same broadcast (spec.md §4.4, §8 property 4).
    let now = time::now();
    message::soft_delete(ctx.store, &req.message_id, &now)?;
    let after = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;
    let deleted_at = after.deleted_at.clone().unwrap_or(now);

    let broadcast = OutboundEnvelope::new(
        "message_deleted",
        MessageDeletedBroadcast {
            message_id: after.id.clone(),
            room_id: after.room_id.clone(),
            deleted_at,
        },
    );
    Ok(HandlerOutcome::broadcast_only(after.room_id, broadcast))
}

/// Deleted messages return the same reply kind with a blanked body and
/// `deleted_at` set, per spec.md §9's open-question resolution.
pub async fn get_context(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: GetMessageContextRequest = decode(data)?;
    let msg = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
    if !auth::is_room_member(ctx.store, ctx.user_id, &msg.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    let room_id = msg.room_id.clone();
    let reply = OutboundEnvelope::new("get_message_context", GetMessageContextReply { message: msg, room_id });
    Ok(HandlerOutcome::reply_only(reply))
}
