//! `search` — full-text search over rooms the caller is a member of
//! (spec.md §4.4).

use crate::auth;
use crate::entities::{membership, message};
use crate::error::{AppError, AppResult};
use crate::protocol::requests::SearchRequest;
use crate::protocol::responses::{SearchHit, SearchReply};
use crate::protocol::{HandlerOutcome, OutboundEnvelope};

use super::{decode, Ctx};

/// Split on whitespace, quote each term to escape FTS5 operators, append a
/// `*` for prefix matching, join with a space for implicit AND (spec.md
/// §4.4's exact escaping rule).
fn build_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn handle(ctx: &Ctx<'_>, data: &serde_json::value::RawValue) -> AppResult<HandlerOutcome> {
    let req: SearchRequest = decode(data)?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("search query must not be empty".to_string()));
    }
    if !(1..=100).contains(&req.limit) {
        return Err(AppError::Validation("limit must be between 1 and 100".to_string()));
    }

    let offset: i64 = match &req.cursor {
        Some(c) => c.parse().map_err(|_| AppError::Validation("invalid cursor".to_string()))?,
        None => 0,
    };

    if let Some(room_id) = &req.room_id {
        if !auth::is_room_member(ctx.store, ctx.user_id, room_id).await? {
            return Err(AppError::Authorization("not a member of this room".to_string()));
        }
    }

    let member_room_ids = membership::all_room_ids_for_user(ctx.store, ctx.user_id).await?;
    if member_room_ids.is_empty() {
        let reply = OutboundEnvelope::new(
            "search",
            SearchReply { query: query.to_string(), results: Vec::new(), next_cursor: None },
        );
        return Ok(HandlerOutcome::reply_only(reply));
    }

    let fts_query = build_fts_query(query);
    let mut rows = message::search(
        ctx.store,
        &fts_query,
        &member_room_ids,
        req.room_id.as_deref(),
        req.user_id.as_deref(),
        req.limit + 1,
        offset,
    )
    .await?;

    let has_more = rows.len() as i64 > req.limit;
    if has_more {
        rows.truncate(req.limit as usize);
    }
    let next_cursor = if has_more { Some((offset + req.limit).to_string()) } else { None };

    let results = rows
        .into_iter()
        .map(|(message, snippet)| SearchHit { message, snippet })
        .collect();

    let reply = OutboundEnvelope::new("search", SearchReply { query: query.to_string(), results, next_cursor });
    Ok(HandlerOutcome::reply_only(reply))
}
