use rusqlite::params;

use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Membership {
    pub user_id: String,
    pub room_id: String,
}

pub fn insert(conn: &rusqlite::Connection, user_id: &str, room_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO rooms_members (user_id, room_id) VALUES (?1, ?2)",
        params![user_id, room_id],
    )?;
    Ok(())
}

pub fn delete(store: &Store, user_id: &str, room_id: &str) -> rusqlite::Result<()> {
    store.exec(
        "DELETE FROM rooms_members WHERE user_id = ?1 AND room_id = ?2",
        params![user_id, room_id],
    )?;
    Ok(())
}

pub async fn room_ids_for_user(store: &Store, user_id: &str, room_type: &str) -> rusqlite::Result<Vec<String>> {
    let sql = "SELECT m.room_id FROM rooms_members m \
               JOIN rooms r ON r.id = m.room_id \
               WHERE m.user_id = ?1 AND r.room_type = ?2 ORDER BY r.name";
    store
        .query(sql, params![user_id, room_type], |r| r.get(0))
        .await
}

/// All room ids (channel or dm) the user belongs to, used to scope
/// `search` to rooms the caller is actually a member of (spec.md §4.4,
/// §8 property 7).
pub async fn all_room_ids_for_user(store: &Store, user_id: &str) -> rusqlite::Result<Vec<String>> {
    store
        .query(
            "SELECT room_id FROM rooms_members WHERE user_id = ?1",
            params![user_id],
            |r| r.get(0),
        )
        .await
}

pub async fn member_user_ids(store: &Store, room_id: &str) -> rusqlite::Result<Vec<String>> {
    store
        .query(
            "SELECT user_id FROM rooms_members WHERE room_id = ?1 ORDER BY user_id",
            params![room_id],
            |r| r.get(0),
        )
        .await
}
