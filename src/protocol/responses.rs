//! Reply/broadcast payload shapes, one per spec.md §4.4 table row.

use serde::Serialize;

use crate::entities::{Message, Room, User};

#[derive(Debug, Serialize)]
pub struct ErrorReply {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub is_member: bool,
}

#[derive(Debug, Serialize)]
pub struct DmSummary {
    #[serde(flatten)]
    pub room: Room,
    pub members: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct InitReply {
    pub user: User,
    pub rooms: Vec<RoomSummary>,
    pub dms: Vec<DmSummary>,
    pub current_room: Option<Room>,
}

#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct MessageEditedBroadcast {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct MessageDeletedBroadcast {
    pub message_id: String,
    pub room_id: String,
    pub deleted_at: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactionAction {
    Add,
    Remove,
}

#[derive(Debug, Serialize)]
pub struct ReactionUpdatedBroadcast {
    pub message_id: String,
    pub room_id: String,
    pub emoji: String,
    pub user_id: String,
    pub action: ReactionAction,
}

#[derive(Debug, Serialize)]
pub struct HistoryReply {
    pub room_id: String,
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub message: Message,
    /// FTS `snippet()` output, `**…**` markers around matched terms
    /// (spec.md §4.4).
    pub snippet: String,
}

#[derive(Debug, Serialize)]
pub struct SearchReply {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetMessageContextReply {
    pub message: Message,
    pub room_id: String,
}

#[derive(Debug, Serialize)]
pub struct JoinRoomReply {
    pub room: Room,
    pub joined: bool,
}

#[derive(Debug, Serialize)]
pub struct LeaveRoomReply {
    pub room_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomReply {
    pub room: Room,
}

#[derive(Debug, Serialize)]
pub struct CreateDmReply {
    pub room: Room,
    pub created: bool,
    pub members: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct ListRoomsReply {
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize)]
pub struct RoomInfoReply {
    #[serde(flatten)]
    pub room: Room,
    pub members: Vec<User>,
    pub member_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ListUsersReply {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct ProfileReply {
    pub user: User,
}
