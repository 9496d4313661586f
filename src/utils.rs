//! Common utilities shared across modules.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string, e.g. `2026-10-19T08:15:02Z`.
pub fn iso8601_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
