//! Relative timestamps for presentation layers ("5m ago").

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Formats the age of `posted` relative to `now`.
///
/// Anything older than a week falls back to the calendar date.
pub fn format(posted: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - posted).num_seconds();
    match secs {
        s if s < MINUTE => "Just now".to_string(),
        s if s < HOUR => format!("{}m ago", s / MINUTE),
        s if s < DAY => format!("{}h ago", s / HOUR),
        s if s < WEEK => format!("{}d ago", s / DAY),
        _ => posted.format("%b %-d, %Y").to_string(),
    }
}
