//! Membership/ownership/default-room/DM-size predicates (spec.md §4.3).
//!
//! Every mutating handler calls the relevant predicate before committing,
//! per spec.md §4.4. Lifted from the inline `EXISTS`/`COUNT(*)` checks
//! scattered through the teacher's route handlers into reusable functions.

use rusqlite::params;

use crate::store::Store;

pub async fn is_room_member(store: &Store, user_id: &str, room_id: &str) -> rusqlite::Result<bool> {
    let exists: Option<i64> = store
        .query_one(
            "SELECT 1 FROM rooms_members WHERE user_id = ?1 AND room_id = ?2",
            params![user_id, room_id],
            |r| r.get(0),
        )
        .await?;
    Ok(exists.is_some())
}

pub async fn is_message_owner(store: &Store, user_id: &str, message_id: &str) -> rusqlite::Result<bool> {
    let owner: Option<String> = store
        .query_one(
            "SELECT user_id FROM messages WHERE id = ?1",
            params![message_id],
            |r| r.get(0),
        )
        .await?;
    Ok(owner.as_deref() == Some(user_id))
}

pub async fn is_default_room(store: &Store, room_id: &str) -> rusqlite::Result<bool> {
    let is_default: Option<i64> = store
        .query_one(
            "SELECT 1 FROM rooms WHERE id = ?1 AND is_default = 1",
            params![room_id],
            |r| r.get(0),
        )
        .await?;
    Ok(is_default.is_some())
}

pub async fn dm_member_count(store: &Store, room_id: &str) -> rusqlite::Result<i64> {
    store
        .query_one(
            "SELECT COUNT(*) FROM rooms_members WHERE room_id = ?1",
            params![room_id],
            |r| r.get(0),
        )
        .await
        .map(|v| v.unwrap_or(0))
}
