//! RFC3339-nanosecond timestamps (spec.md §3 — `Message.created_at`).
//!
//! The teacher stamps rows with `chrono::Utc::now().to_rfc3339()`
//! (second precision); the core needs nanosecond precision so that
//! `created_at` alone is a total order suitable as a history cursor.

use chrono::SecondsFormat;

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}
