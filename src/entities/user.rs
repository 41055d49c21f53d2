use rusqlite::{params, Row};
use serde::Serialize;

use crate::store::Store;

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub status: String,
    pub avatar: Option<String>,
    pub last_room_id: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

const COLUMNS: &str =
    "id, username, password_hash, display_name, status, avatar, last_room_id, created_at, modified_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        display_name: row.get(3)?,
        status: row.get(4)?,
        avatar: row.get(5)?,
        last_room_id: row.get(6)?,
        created_at: row.get(7)?,
        modified_at: row.get(8)?,
    })
}

pub async fn by_id(store: &Store, id: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
    store.query_one(&sql, params![id], from_row).await
}

pub async fn by_username(store: &Store, username: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE username = ?1");
    store.query_one(&sql, params![username], from_row).await
}

/// Load every user in `ids`, in unspecified order. Used to assemble member
/// lists for `room_info`, `create_dm`, and `init`'s DM summaries.
pub async fn by_ids(store: &Store, ids: &[String]) -> rusqlite::Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id IN ({placeholders})");
    let values: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
    store.query(&sql, &values, from_row).await
}

pub async fn search_by_username(store: &Store, query: &str, exclude_user_id: &str, limit: i64) -> rusqlite::Result<Vec<User>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM users WHERE id != ?1 AND username LIKE ?2 ESCAPE '\\' ORDER BY username LIMIT ?3"
    );
    let pattern = format!("%{}%", escape_like(query));
    store
        .query(&sql, params![exclude_user_id, pattern, limit], from_row)
        .await
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub fn set_last_room(store: &Store, user_id: &str, room_id: &str, now: &str) -> rusqlite::Result<()> {
    store.exec(
        "UPDATE users SET last_room_id = ?1, modified_at = ?2 WHERE id = ?3",
        params![room_id, now, user_id],
    )?;
    Ok(())
}

pub fn update_profile(
    store: &Store,
    user_id: &str,
    display_name: Option<&str>,
    status: Option<&str>,
    now: &str,
) -> rusqlite::Result<()> {
    if let Some(name) = display_name {
        store.exec(
            "UPDATE users SET display_name = ?1, modified_at = ?2 WHERE id = ?3",
            params![name, now, user_id],
        )?;
    }
    if let Some(status_val) = status {
        store.exec(
            "UPDATE users SET status = ?1, modified_at = ?2 WHERE id = ?3",
            params![status_val, now, user_id],
        )?;
    }
    Ok(())
}
