//! `get_profile` / `update_profile` — always scoped to the caller (spec.md
//! §4.4).

use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::protocol::requests::UpdateProfileRequest;
use crate::protocol::responses::ProfileReply;
use crate::protocol::{HandlerOutcome, OutboundEnvelope};
use crate::time;

use super::{decode, Ctx};

pub async fn get(ctx: &Ctx<'_>) -> AppResult<HandlerOutcome> {
    let me = user::by_id(ctx.store, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    let reply = OutboundEnvelope::new("get_profile", ProfileReply { user: me });
    Ok(HandlerOutcome::reply_only(reply))
}

pub async fn update(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: UpdateProfileRequest = decode(data)?;
    if req.display_name.is_none() && req.status.is_none() {
        return Err(AppError::Validation("update_profile requires at least one field".to_string()));
    }
    if let Some(name) = &req.display_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("display_name must not be empty".to_string()));
        }
    }

    let now = time::now();
    user::update_profile(ctx.store, ctx.user_id, req.display_name.as_deref(), req.status.as_deref(), &now)?;
    let updated = user::by_id(ctx.store, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Storage(rusqlite::Error::QueryReturnedNoRows))?;

    let reply = OutboundEnvelope::new("update_profile", ProfileReply { user: updated });
    Ok(HandlerOutcome::reply_only(reply))
}
