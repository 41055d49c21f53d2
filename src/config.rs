//! Process configuration, read once from the environment at boot.
//!
//! Same approach as the teacher's `RateLimitConfig::from_env` and
//! `rocket_with_db`'s `DATABASE_PATH`/`STATIC_DIR` lookups: plain
//! `std::env::var`, defaults baked in, no config-file crate.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the embedded SQLite file.
    pub database_path: String,
    /// Address the WebSocket server binds to.
    pub listen_addr: String,
    /// Max inbound frame size in bytes. spec.md §9 flags the original's
    /// hard-coded 512 as too tight for real bodies; this resolves that by
    /// making it configurable, default unchanged.
    pub ws_max_frame_bytes: usize,
    /// Seconds of read-silence before a connection is presumed dead.
    pub pong_wait_secs: u64,
    /// Per-frame write deadline, in seconds.
    pub write_wait_secs: u64,
    /// Number of connections in the read-only pool.
    pub read_pool_size: usize,
    /// Outbound queue capacity per connection before the hub evicts it.
    pub outbound_capacity: usize,
    /// Mirrors the external registration collaborator's env var: the core
    /// only reads this to decide whether fixture seeding already ran.
    pub seed_development_db: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/chat.db".to_string()),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            ws_max_frame_bytes: env_or("WS_MAX_FRAME_BYTES", 512),
            pong_wait_secs: env_or("PONG_WAIT_SECS", 60),
            write_wait_secs: env_or("WRITE_WAIT_SECS", 10),
            read_pool_size: env_or("READ_POOL_SIZE", cpu_count.max(4)),
            outbound_capacity: env_or("WS_OUTBOUND_CAPACITY", 256),
            seed_development_db: env::var("SEED_DEVELOPMENT_DB").is_ok(),
        }
    }

    /// The ping interval derived from `pong_wait`, per spec.md §4.6
    /// (`ping_period = pong_wait * 9/10`).
    pub fn ping_period_secs(&self) -> u64 {
        self.pong_wait_secs * 9 / 10
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "data/chat.db".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            ws_max_frame_bytes: 512,
            pong_wait_secs: 60,
            write_wait_secs: 10,
            read_pool_size: 4,
            outbound_capacity: 256,
            seed_development_db: false,
        }
    }
}
