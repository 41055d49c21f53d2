//! Error kinds shared by every layer above the store.
//!
//! Mirrors the seven-way classification in spec.md §7. The teacher
//! classifies the same way but ad hoc, one `(Status, Json<Value>)` tuple per
//! Rocket route; here the dispatcher is the only place that needs to turn an
//! `AppError` into wire bytes, so one enum suffices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed envelope or `data` payload. Never reaches an `error`
    /// envelope — the connection is torn down instead.
    #[error("decode error: {0}")]
    Decode(String),

    /// Present but invalid fields (empty body, limit out of range, ...).
    #[error("{0}")]
    Validation(String),

    /// Not a member, not the owner, attempt to leave default/too-small DM.
    #[error("{0}")]
    Authorization(String),

    /// Missing message/room/user.
    #[error("{0}")]
    NotFound(String),

    /// Room name taken, including a race lost to a unique constraint.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected storage failure. Display text is deliberately generic;
    /// the underlying error is logged, not echoed to the caller.
    #[error("storage failure")]
    Storage(#[from] rusqlite::Error),

    /// Read/write failure, timeout, or frame size limit exceeded on the
    /// socket. Never reaches an `error` envelope — tears the connection down.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AppError {
    /// True for the two kinds spec.md §7 says close the connection instead
    /// of replying with an `error` envelope.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Decode(_) | AppError::Transport(_))
    }

    /// The message to put in an `error` envelope's `message` field. Storage
    /// errors are deliberately generic so internals never leak to clients.
    pub fn wire_message(&self) -> String {
        match self {
            AppError::Storage(_) => "a storage error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
