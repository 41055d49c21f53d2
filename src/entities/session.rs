use rusqlite::params;

use crate::store::Store;

/// Owned and mutated by the external auth collaborator; the core only
/// resolves a session id to a user id (spec.md §6's handshake contract).
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}

pub async fn resolve_user_id(store: &Store, session_id: &str) -> rusqlite::Result<Option<String>> {
    store
        .query_one(
            "SELECT user_id FROM sessions WHERE id = ?1",
            params![session_id],
            |r| r.get(0),
        )
        .await
}
