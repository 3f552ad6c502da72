//! Local entity store: typed collections over a key-value backend plus the
//! domain operations that read and rewrite them.

pub mod accounts;
pub mod audit;
pub mod backend;
pub mod calendar;
pub mod catalog;
pub mod classes;
pub mod collection;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod ids;
pub mod keys;
pub mod lessons;
pub mod messaging;
pub mod models;
pub mod notifications;
pub mod policy;
pub mod reports;
pub mod repository;
pub mod resolve;
pub mod time_settings;

pub use backend::{KeyValueBackend, SqliteBackend};
pub use error::{StoreError, StoreResult};

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use std::cmp::Ordering;

/// Current UTC time as `2024-01-01T00:00:00.000Z`.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Orders timestamps newest first. Unparseable values sort last.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse_ts(a), parse_ts(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

/// Case-insensitive substring match used by every search box.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_millisecond_utc() {
        let ts = now_ts();
        assert!(ts.ends_with('Z'), "{}", ts);
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn newest_first_handles_offsets_and_garbage() {
        assert_eq!(
            newest_first("2024-01-02T00:00:00.000Z", "2024-01-01T00:00:00.000Z"),
            Ordering::Less
        );
        assert_eq!(
            newest_first("2024-01-01T10:00:00+02:00", "2024-01-01T09:00:00.000Z"),
            Ordering::Greater
        );
        assert_eq!(newest_first("garbage", "2024-01-01T00:00:00.000Z"), Ordering::Greater);
    }
}
