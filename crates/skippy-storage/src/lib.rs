// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Skippy memory core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations for the `people`
//! and `facts` tables, and a single-writer concurrency model via `tokio-rusqlite`.

pub mod database;
pub mod migrations;

pub use database::{Database, map_tr_err};

/// Current UTC time in the millisecond ISO-8601 form stored in every
/// `created_at` / `updated_at` / `last_mentioned` column.
pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

/// Format a UTC instant the way timestamps are stored.
pub fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_timestamp(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_round_trips_at_millisecond_precision() {
        let at = chrono::Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 30, 0)
            .unwrap();
        let s = format_timestamp(at);
        assert_eq!(s, "2026-03-01T12:30:00.000Z");
        assert_eq!(parse_timestamp(&s), Some(at));
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
