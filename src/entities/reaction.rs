use rusqlite::params;
use serde::Serialize;

use crate::store::Store;

#[derive(Debug, Serialize, Clone)]
pub struct Reaction {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at: String,
}

/// Upsert-on-insert: re-adding the same `(message, user, emoji)` triple is a
/// no-op, making `add_reaction` idempotent (spec.md §8 property 5).
pub fn upsert(store: &Store, message_id: &str, user_id: &str, emoji: &str, now: &str) -> rusqlite::Result<()> {
    store.exec(
        "INSERT INTO reactions (message_id, user_id, emoji, created_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(message_id, user_id, emoji) DO NOTHING",
        params![message_id, user_id, emoji, now],
    )?;
    Ok(())
}

/// Removing an absent triple is success, not an error (spec.md §8 property 5).
pub fn remove(store: &Store, message_id: &str, user_id: &str, emoji: &str) -> rusqlite::Result<()> {
    store.exec(
        "DELETE FROM reactions WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
        params![message_id, user_id, emoji],
    )?;
    Ok(())
}
