//! Write-side inputs and outcomes. Read results are the savor-types models.
use chrono::{DateTime, Utc};
use savor_types::models::{CategoryId, ThreadId};
use tracing::warn;

/// Fallback display name for users created without one.
pub const ANONYMOUS: &str = "Anonymous";

/// The acting user as supplied with a write.
///
/// With a `name` the user row is upserted (last writer wins on name and
/// avatar). Without one the row is only created if missing.
#[derive(Debug, Clone)]
pub struct Author {
    pub id: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewThread {
    pub category_id: CategoryId,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub thread_id: ThreadId,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Liked,
    Unliked,
    MissingTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyInitialized,
}

/// Parse a stored timestamp. Rows written by this crate are RFC 3339; older
/// rows may use SQLite's "YYYY-MM-DD HH:MM:SS" form without a timezone.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339_millis() {
        let ts = parse_timestamp("2026-03-04T05:06:07.089Z");
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.timestamp_subsec_millis(), 89);
    }

    #[test]
    fn parses_sqlite_datetime() {
        let ts = parse_timestamp("2026-03-04 05:06:07");
        assert_eq!(ts.hour(), 5);
        assert_eq!(ts.second(), 7);
    }

    #[test]
    fn garbage_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }
}
