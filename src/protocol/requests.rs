//! Per-`type` request shapes decoded from an envelope's `data` field.
//!
//! One struct per row of spec.md §4.4's handler catalog, same flat-struct
//! style as the teacher's `models.rs` (`SendMessage`, `EditMessage`, ...).

use serde::Deserialize;

fn default_history_limit() -> i64 {
    50
}

fn default_search_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
    pub room_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub message_id: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessageRequest {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddReactionRequest {
    pub message_id: String,
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveReactionRequest {
    pub message_id: String,
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub room_id: String,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetMessageContextRequest {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    pub room_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateDmRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListRoomsRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomInfoRequest {
    pub room_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListUsersRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
