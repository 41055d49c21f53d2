//! `list_users` — username substring search excluding the caller (spec.md
//! §4.4).

use crate::entities::user;
use crate::error::AppResult;
use crate::protocol::requests::ListUsersRequest;
use crate::protocol::responses::ListUsersReply;
use crate::protocol::{HandlerOutcome, OutboundEnvelope};

use super::{decode, Ctx};

const LIST_USERS_LIMIT: i64 = 20;

pub async fn list(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: ListUsersRequest = decode(data)?;
    let users = user::search_by_username(ctx.store, req.query.trim(), ctx.user_id, LIST_USERS_LIMIT).await?;
    let reply = OutboundEnvelope::new("list_users", ListUsersReply { users });
    Ok(HandlerOutcome::reply_only(reply))
}
