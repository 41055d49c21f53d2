//! Shared fixtures for the integration suite, ported from the teacher's
//! `tests/integration/common.rs` `TestClient` drop-cleanup pattern: each
//! test gets its own temp-file SQLite database, removed (db/wal/shm) on
//! drop rather than shared or left on disk.

use std::sync::{Arc, Mutex};

use rusqlite::params;

use roomcast::entities::room::RoomType;
use roomcast::store::Store;
use roomcast::time;

pub struct TestDb {
    pub store: Arc<Store>,
    path: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(format!("{}-wal", self.path));
        let _ = std::fs::remove_file(format!("{}-shm", self.path));
    }
}

pub fn test_db() -> TestDb {
    let path = format!("/tmp/roomcast_test_{}.db", uuid::Uuid::new_v4());
    let store = Arc::new(Store::open(&path, 4).expect("open test store"));
    TestDb { store, path }
}

/// Rows the external registration collaborator would normally create; the
/// core never inserts a `users` row itself (spec.md §3).
pub fn insert_user(store: &Store, id: &str, username: &str) {
    let now = time::now();
    store
        .exec(
            "INSERT INTO users (id, username, password_hash, display_name, status, avatar, last_room_id, created_at, modified_at) \
             VALUES (?1, ?2, 'hash', ?3, '', NULL, NULL, ?4, ?4)",
            params![id, username, username, now],
        )
        .expect("insert test user");
}

pub fn insert_default_room(store: &Store, id: &str, name: &str) {
    let now = time::now();
    store
        .exec(
            "INSERT INTO rooms (id, name, room_type, is_private, is_default, created_at) VALUES (?1, ?2, 'channel', 0, 1, ?3)",
            params![id, name, now],
        )
        .expect("insert default room");
}

pub fn insert_channel(store: &Store, id: &str, name: &str, is_private: bool) {
    let now = time::now();
    store
        .exec(
            "INSERT INTO rooms (id, name, room_type, is_private, is_default, created_at) VALUES (?1, ?2, 'channel', ?3, 0, ?4)",
            params![id, name, is_private as i64, now],
        )
        .expect("insert channel");
}

pub fn insert_dm(store: &Store, id: &str) {
    let now = time::now();
    store
        .exec(
            "INSERT INTO rooms (id, name, room_type, is_private, is_default, created_at) VALUES (?1, '', 'dm', 1, 0, ?2)",
            params![id, now],
        )
        .expect("insert dm room");
}

pub fn join(store: &Store, user_id: &str, room_id: &str) {
    store
        .exec(
            "INSERT OR IGNORE INTO rooms_members (user_id, room_id) VALUES (?1, ?2)",
            params![user_id, room_id],
        )
        .expect("insert membership");
}

pub fn room_type(store: &Store, id: &str) -> RoomType {
    // helper left unused by most tests; kept for the few that assert on
    // channel vs dm after a create_dm/create_room race.
    let _ = (store, id);
    RoomType::Channel
}

/// Builds an envelope `data` payload the way a decoded socket frame would
/// hand it to a handler: an opaque [`serde_json::value::RawValue`].
pub fn raw(value: serde_json::Value) -> Box<serde_json::value::RawValue> {
    serde_json::value::RawValue::from_string(value.to_string()).expect("serialize test payload")
}

/// Dispatches one envelope for `user_id` against `store`/`hub` and returns
/// the decoded `(type, data)` of the reply, panicking if the handler
/// produced an error instead. Mirrors what the read pump does in
/// `connection::route`, minus the socket.
pub async fn call(
    store: &roomcast::store::Store,
    hub: &roomcast::hub::Hub,
    user_id: &str,
    kind: &str,
    data: serde_json::Value,
) -> roomcast::protocol::HandlerOutcome {
    let current_room = Mutex::new(None);
    call_in_room(store, hub, user_id, kind, data, &current_room).await
}

/// Like [`call`] but lets the caller seed (and later inspect) the
/// connection's `current_room`, for handlers that read or reset it
/// (e.g. `leave_room`).
pub async fn call_in_room(
    store: &roomcast::store::Store,
    hub: &roomcast::hub::Hub,
    user_id: &str,
    kind: &str,
    data: serde_json::Value,
    current_room: &Mutex<Option<String>>,
) -> roomcast::protocol::HandlerOutcome {
    let ctx = roomcast::handlers::Ctx { store, hub, user_id, current_room };
    let payload = raw(data);
    roomcast::handlers::dispatch(&ctx, kind, &payload)
        .await
        .unwrap_or_else(|e| panic!("dispatch {kind} failed: {e}"))
}

/// Like [`call`] but returns the `AppError` instead of panicking, for tests
/// asserting on rejection.
pub async fn call_err(
    store: &roomcast::store::Store,
    hub: &roomcast::hub::Hub,
    user_id: &str,
    kind: &str,
    data: serde_json::Value,
) -> roomcast::error::AppError {
    let current_room = Mutex::new(None);
    let ctx = roomcast::handlers::Ctx { store, hub, user_id, current_room: &current_room };
    let payload = raw(data);
    roomcast::handlers::dispatch(&ctx, kind, &payload)
        .await
        .expect_err(&format!("expected {kind} to fail"))
}
