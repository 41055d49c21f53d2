//! Binary entry point: wires up the store, the hub, and the WebSocket
//! upgrade route (spec.md §6's CLI surface — "a single flag for listen
//! address; the core itself has no other CLI").
//!
//! The session-cookie → user-id handshake described in spec.md §6 belongs
//! to an external registration/login collaborator; this binary stands in
//! for just enough of it (a `session` query parameter resolved through
//! [`roomcast::entities::session::resolve_user_id`]) to upgrade a real
//! socket, matching the contract the core actually depends on.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use roomcast::connection;
use roomcast::entities::session;
use roomcast::{Config, Hub, Store};

#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    hub: Hub,
    config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())))
        .init();

    let config = Arc::new(Config::from_env());
    let store = Arc::new(Store::open(&config.database_path, config.read_pool_size).expect("open store"));
    let hub = Hub::spawn();

    let listen_addr = config.listen_addr.clone();
    let state = AppState { store, hub, config };

    let app = Router::new().route("/ws", get(upgrade)).with_state(state);

    info!(addr = %listen_addr, "roomcast listening");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await.expect("bind listen address");
    axum::serve(listener, app).await.expect("server error");
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(session_id) = params.get("session") else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let user_id = match session::resolve_user_id(&state.store, session_id).await {
        Ok(Some(uid)) => uid,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let max_frame_bytes = state.config.ws_max_frame_bytes;
    ws.max_message_size(max_frame_bytes)
        .on_upgrade(move |socket| connection::handle_socket(socket, state.store, state.hub, state.config, user_id))
}
