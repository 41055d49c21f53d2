//! `add_reaction` / `remove_reaction` (spec.md §4.4).

use crate::auth;
use crate::entities::{message, reaction};
use crate::error::{AppError, AppResult};
use crate::protocol::requests::{AddReactionRequest, RemoveReactionRequest};
use crate::protocol::responses::{ReactionAction, ReactionUpdatedBroadcast};
use crate::protocol::{HandlerOutcome, OutboundEnvelope};
use crate::time;

use super::{decode, Ctx};

pub async fn add(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: AddReactionRequest = decode(data)?;
    if req.emoji.is_empty() {
        return Err(AppError::Validation("emoji must not be empty".to_string()));
    }

    let msg = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
    if !auth::is_room_member(ctx.store, ctx.user_id, &msg.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }
    if msg.deleted_at.is_some() {
        return Err(AppError::Validation("cannot react to a deleted message".to_string()));
    }

    // Upsert-on-insert makes re-adding the same triple a no-op (spec.md §8
    // property 5).
    reaction::upsert(ctx.store, &req.message_id, ctx.user_id, &req.emoji, &time::now())?;

    let broadcast = OutboundEnvelope::new(
        "reaction_updated",
        ReactionUpdatedBroadcast {
            message_id: req.message_id,
            room_id: msg.room_id.clone(),
            emoji: req.emoji,
            user_id: ctx.user_id.to_string(),
            action: ReactionAction::Add,
        },
    );
    Ok(HandlerOutcome::broadcast_only(msg.room_id, broadcast))
}

pub async fn remove(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: RemoveReactionRequest = decode(data)?;

    let msg = message::by_id(ctx.store, &req.message_id)
        .await?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
    if !auth::is_room_member(ctx.store, ctx.user_id, &msg.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    // Removing an absent triple is success, not an error (spec.md §8
    // property 5).
    reaction::remove(ctx.store, &req.message_id, ctx.user_id, &req.emoji)?;

    let broadcast = OutboundEnvelope::new(
        "reaction_updated",
        ReactionUpdatedBroadcast {
            message_id: req.message_id,
            room_id: msg.room_id.clone(),
            emoji: req.emoji,
            user_id: ctx.user_id.to_string(),
            action: ReactionAction::Remove,
        },
    );
    Ok(HandlerOutcome::broadcast_only(msg.room_id, broadcast))
}
