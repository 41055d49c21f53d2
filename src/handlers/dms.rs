//! `create_dm` — find-or-create a direct message room for an exact member
//! set (spec.md §4.4).

use crate::entities::{membership, room, user};
use crate::error::{AppError, AppResult};
use crate::ids;
use crate::protocol::requests::CreateDmRequest;
use crate::protocol::responses::CreateDmReply;
use crate::protocol::{HandlerOutcome, OutboundEnvelope};
use crate::time;

use super::{decode, Ctx};

pub async fn create(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: CreateDmRequest = decode(data)?;
    if req.user_ids.is_empty() {
        return Err(AppError::Validation("create_dm requires at least one other user".to_string()));
    }

    for target_id in &req.user_ids {
        if user::by_id(ctx.store, target_id).await?.is_none() {
            return Err(AppError::NotFound(format!("user {target_id} not found")));
        }
    }

    // Sorted, deduplicated member set including the caller — a DM of {A,B}
    // is distinct from {A,B,C} (spec.md §4.4).
    let mut member_ids: Vec<String> = req.user_ids.clone();
    member_ids.push(ctx.user_id.to_string());
    member_ids.sort();
    member_ids.dedup();
    if member_ids.len() < 2 {
        return Err(AppError::Validation("create_dm requires at least two distinct members".to_string()));
    }

    if let Some(existing) = room::find_dm_with_members(ctx.store, &member_ids).await? {
        let members = user::by_ids(ctx.store, &member_ids).await?;
        let now = time::now();
        user::set_last_room(ctx.store, ctx.user_id, &existing.id, &now)?;
        let room_id = existing.id.clone();
        let reply = OutboundEnvelope::new(
            "create_dm",
            CreateDmReply { room: existing, created: false, members },
        );
        return Ok(HandlerOutcome::reply_only(reply).with_current_room(Some(room_id)));
    }

    let id = ids::room_id();
    let now = time::now();
    let members_for_txn = member_ids.clone();
    ctx.store.with_write_txn(|conn| -> Result<(), AppError> {
        room::insert_dm(conn, &id, &now)?;
        for member_id in &members_for_txn {
            membership::insert(conn, member_id, &id)?;
        }
        Ok(())
    })?;
    user::set_last_room(ctx.store, ctx.user_id, &id, &now)?;

    let created = room::by_id(ctx.store, &id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;
    let members = user::by_ids(ctx.store, &member_ids).await?;
    let room_id = created.id.clone();

    let reply = OutboundEnvelope::new("create_dm", CreateDmReply { room: created, created: true, members });
    Ok(HandlerOutcome::reply_only(reply).with_current_room(Some(room_id)))
}
