use rusqlite::{params, Row};
use serde::Serialize;

use crate::store::Store;

#[derive(Debug, Serialize, Clone)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    /// Denormalized at read time by joining `users` (spec.md §9 — never
    /// duplicated in storage, populated fresh on every query).
    pub username: String,
    pub body: String,
    pub created_at: String,
    pub modified_at: String,
    pub deleted_at: Option<String>,
}

const SELECT_WITH_USERNAME: &str =
    "SELECT m.id, m.room_id, m.user_id, u.username, m.body, m.created_at, m.modified_at, m.deleted_at \
     FROM messages m JOIN users u ON u.id = m.user_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        room_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        modified_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

pub async fn by_id(store: &Store, id: &str) -> rusqlite::Result<Option<Message>> {
    let sql = format!("{SELECT_WITH_USERNAME} WHERE m.id = ?1");
    store.query_one(&sql, params![id], from_row).await
}

pub fn insert(
    conn: &rusqlite::Connection,
    id: &str,
    room_id: &str,
    user_id: &str,
    body: &str,
    now: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO messages (id, room_id, user_id, body, created_at, modified_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, room_id, user_id, body, now],
    )?;
    Ok(())
}

pub fn edit(store: &Store, id: &str, body: &str, now: &str) -> rusqlite::Result<()> {
    store.exec(
        "UPDATE messages SET body = ?1, modified_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        params![body, now, id],
    )?;
    Ok(())
}

/// Soft-delete: clears `body`, sets `deleted_at`. Idempotent — calling this
/// twice leaves the row unchanged the second time (spec.md §8 property 4).
pub fn soft_delete(store: &Store, id: &str, now: &str) -> rusqlite::Result<()> {
    store.exec(
        "UPDATE messages SET body = '', deleted_at = COALESCE(deleted_at, ?1), modified_at = ?1 \
         WHERE id = ?2 AND deleted_at IS NULL",
        params![now, id],
    )?;
    Ok(())
}

/// Newest-first page of non-deleted messages older than `cursor`
/// (`cursor` is the `created_at` of the last row the caller already saw).
/// Fetches `limit + 1` rows so the caller can compute `has_more` without a
/// second query (spec.md §4.4).
pub async fn history_page(
    store: &Store,
    room_id: &str,
    cursor: Option<&str>,
    fetch_limit: i64,
) -> rusqlite::Result<Vec<Message>> {
    match cursor {
        Some(c) => {
            let sql = format!(
                "{SELECT_WITH_USERNAME} WHERE m.room_id = ?1 AND m.deleted_at IS NULL AND m.created_at < ?2 \
                 ORDER BY m.created_at DESC, m.id DESC LIMIT ?3"
            );
            store.query(&sql, params![room_id, c, fetch_limit], from_row).await
        }
        None => {
            let sql = format!(
                "{SELECT_WITH_USERNAME} WHERE m.room_id = ?1 AND m.deleted_at IS NULL \
                 ORDER BY m.created_at DESC, m.id DESC LIMIT ?2"
            );
            store.query(&sql, params![room_id, fetch_limit], from_row).await
        }
    }
}

fn from_row_with_snippet(row: &Row<'_>) -> rusqlite::Result<(Message, String)> {
    Ok((from_row(row)?, row.get(8)?))
}

/// FTS5 full-text search scoped to the rooms the caller is a member of
/// (spec.md §8 property 7). `fts_query` is already escaped/quoted by the
/// caller (spec.md §4.4's term-quoting rule); `member_room_ids` is always
/// non-empty by the time this is called — callers with no memberships
/// never reach the query.
#[allow(clippy::too_many_arguments)]
pub async fn search(
    store: &Store,
    fts_query: &str,
    member_room_ids: &[String],
    room_filter: Option<&str>,
    user_filter: Option<&str>,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<(Message, String)>> {
    let member_placeholders = member_room_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let mut sql = format!(
        "SELECT m.id, m.room_id, m.user_id, u.username, m.body, m.created_at, m.modified_at, m.deleted_at, \
         snippet(messages_fts, 0, '**', '**', '...', 20) AS snippet \
         FROM messages_fts \
         JOIN messages m ON m.rowid = messages_fts.rowid \
         JOIN users u ON u.id = m.user_id \
         WHERE messages_fts MATCH ?1 AND m.deleted_at IS NULL AND m.room_id IN ({member_placeholders})"
    );
    let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
    values.push(&fts_query);
    for id in member_room_ids {
        values.push(id);
    }
    if let Some(rid) = room_filter {
        sql.push_str(" AND m.room_id = ?");
        values.push(&rid);
    }
    if let Some(uid) = user_filter {
        sql.push_str(" AND m.user_id = ?");
        values.push(&uid);
    }
    sql.push_str(" ORDER BY rank LIMIT ? OFFSET ?");
    values.push(&limit);
    values.push(&offset);

    store.query(&sql, &values, from_row_with_snippet).await
}
