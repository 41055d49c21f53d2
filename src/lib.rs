//! Real-time multi-room chat core: connection hub, command dispatcher, and
//! embedded-SQLite store with full-text search (spec.md §1).
//!
//! The HTTP registration/login surface, static file serving, and the REST
//! façade are external collaborators (spec.md §1's "out of scope" list) —
//! this crate exposes only the WebSocket upgrade entry point
//! (`connection::handle_socket`) and the session→user lookup
//! (`entities::session::resolve_user_id`) those collaborators consume.

pub mod auth;
pub mod config;
pub mod connection;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod ids;
pub mod protocol;
pub mod store;
pub mod time;

pub use config::Config;
pub use hub::Hub;
pub use store::Store;
