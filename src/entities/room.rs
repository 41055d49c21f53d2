use rusqlite::{params, Row};
use serde::Serialize;

use crate::store::Store;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Channel,
    Dm,
}

impl RoomType {
    fn as_str(self) -> &'static str {
        match self {
            RoomType::Channel => "channel",
            RoomType::Dm => "dm",
        }
    }

    fn parse(s: &str) -> RoomType {
        match s {
            "dm" => RoomType::Dm,
            _ => RoomType::Channel,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub room_type: RoomType,
    pub is_private: bool,
    pub is_default: bool,
    pub created_at: String,
    pub last_message_at: Option<String>,
}

const COLUMNS: &str = "id, name, room_type, is_private, is_default, created_at, last_message_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    let room_type: String = row.get(2)?;
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        room_type: RoomType::parse(&room_type),
        is_private: row.get::<_, i64>(3)? != 0,
        is_default: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
        last_message_at: row.get(6)?,
    })
}

pub async fn by_id(store: &Store, id: &str) -> rusqlite::Result<Option<Room>> {
    let sql = format!("SELECT {COLUMNS} FROM rooms WHERE id = ?1");
    store.query_one(&sql, params![id], from_row).await
}

pub async fn by_name(store: &Store, name: &str) -> rusqlite::Result<Option<Room>> {
    let sql = format!("SELECT {COLUMNS} FROM rooms WHERE name = ?1 AND room_type = 'channel'");
    store.query_one(&sql, params![name], from_row).await
}

pub async fn default_room(store: &Store) -> rusqlite::Result<Option<Room>> {
    let sql = format!("SELECT {COLUMNS} FROM rooms WHERE is_default = 1 LIMIT 1");
    store.query_one(&sql, params![], from_row).await
}

pub async fn public_rooms(store: &Store, name_filter: Option<&str>) -> rusqlite::Result<Vec<Room>> {
    match name_filter {
        Some(q) if !q.is_empty() => {
            let sql = format!(
                "SELECT {COLUMNS} FROM rooms WHERE room_type = 'channel' AND is_private = 0 \
                 AND name LIKE ?1 ESCAPE '\\' ORDER BY name"
            );
            let pattern = format!("%{}%", q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
            store.query(&sql, params![pattern], from_row).await
        }
        _ => {
            let sql = format!(
                "SELECT {COLUMNS} FROM rooms WHERE room_type = 'channel' AND is_private = 0 ORDER BY name"
            );
            store.query(&sql, params![], from_row).await
        }
    }
}

/// Find a DM room whose exact member-id set matches `sorted_member_ids`.
/// Compares vectors exactly per spec.md §4.4 (a DM of {A,B} is distinct from
/// {A,B,C}).
pub async fn find_dm_with_members(store: &Store, sorted_member_ids: &[String]) -> rusqlite::Result<Option<Room>> {
    let sql = "SELECT r.id FROM rooms r \
               JOIN rooms_members m ON m.room_id = r.id \
               WHERE r.room_type = 'dm' \
               GROUP BY r.id \
               HAVING COUNT(*) = ?1 \
               AND COUNT(*) FILTER (WHERE m.user_id IN (".to_string()
        + &sorted_member_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",")
        + ")) = ?1";

    let mut values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(sorted_member_ids.len() + 2);
    let count = sorted_member_ids.len() as i64;
    values.push(&count);
    for id in sorted_member_ids {
        values.push(id);
    }
    values.push(&count);

    let candidate_id: Option<String> = store.query_one(&sql, &values, |r| r.get(0)).await?;
    match candidate_id {
        Some(id) => by_id(store, &id).await,
        None => Ok(None),
    }
}

pub fn insert_channel(conn: &rusqlite::Connection, id: &str, name: &str, is_private: bool, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, name, room_type, is_private, is_default, created_at) \
         VALUES (?1, ?2, 'channel', ?3, 0, ?4)",
        params![id, name, is_private as i64, now],
    )?;
    Ok(())
}

pub fn insert_dm(conn: &rusqlite::Connection, id: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, name, room_type, is_private, is_default, created_at) \
         VALUES (?1, '', 'dm', 1, 0, ?2)",
        params![id, now],
    )?;
    Ok(())
}

pub fn delete(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn touch_last_message(conn: &rusqlite::Connection, room_id: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE rooms SET last_message_at = ?1 WHERE id = ?2",
        params![now, room_id],
    )?;
    Ok(())
}
