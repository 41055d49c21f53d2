//! Typed rows + CRUD/finders, one module per entity (spec.md §4.2).
//!
//! Lifts the row-mapping closures the teacher repeats inline in every
//! `src/routes/*.rs` handler (see e.g. `messages.rs`'s twelve-column
//! `query_row` closure, copy-pasted four times) into one finder per shape.

pub mod membership;
pub mod message;
pub mod reaction;
pub mod room;
pub mod session;
pub mod user;

pub use membership::Membership;
pub use message::Message;
pub use reaction::Reaction;
pub use room::{Room, RoomType};
pub use session::Session;
pub use user::User;
