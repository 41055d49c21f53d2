//! `history` — newest-first paginated room message history (spec.md §4.4).

use crate::auth;
use crate::entities::message;
use crate::error::{AppError, AppResult};
use crate::protocol::requests::HistoryRequest;
use crate::protocol::responses::HistoryReply;
use crate::protocol::{HandlerOutcome, OutboundEnvelope};

use super::{decode, Ctx};

pub async fn handle(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: HistoryRequest = decode(data)?;
    if !(1..=100).contains(&req.limit) {
        return Err(AppError::Validation("limit must be between 1 and 100".to_string()));
    }
    if !auth::is_room_member(ctx.store, ctx.user_id, &req.room_id).await? {
        return Err(AppError::Authorization("not a member of this room".to_string()));
    }

    // Fetch limit+1 to detect has_more without a second query (spec.md §4.4).
    let mut page = message::history_page(ctx.store, &req.room_id, req.cursor.as_deref(), req.limit + 1).await?;
    let has_more = page.len() as i64 > req.limit;
    if has_more {
        page.truncate(req.limit as usize);
    }
    let next_cursor = if has_more {
        page.last().map(|m| m.created_at.clone())
    } else {
        None
    };

    let reply = OutboundEnvelope::new(
        "history",
        HistoryReply { room_id: req.room_id, messages: page, has_more, next_cursor },
    );
    Ok(HandlerOutcome::reply_only(reply))
}
