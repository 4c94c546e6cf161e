//! Database models for persistent storage.

mod account;
mod game;
mod record;

pub use account::*;
pub use game::*;
pub use record::*;

use chrono::{DateTime, SubsecRound, Utc};

/// Timestamps are stored as Unix milliseconds.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// `at` at stored precision, so a returned record equals its re-read row.
pub(crate) fn stored_time(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
