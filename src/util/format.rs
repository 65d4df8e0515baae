//! Display helpers shared by the terminal views.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

const YEAR_SECS: i64 = 31_536_000;
const MONTH_SECS: i64 = 2_592_000;
const DAY_SECS: i64 = 86_400;
const HOUR_SECS: i64 = 3_600;
const MINUTE_SECS: i64 = 60;

/// Parse a backend timestamp. Timestamps without an offset are read in the
/// viewer's offset, taken from `now`.
#[must_use]
pub fn parse_timestamp(raw: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT)
        .map(|naive| naive.assume_offset(now.offset()))
        .ok()
}

/// Coarse relative time such as `"5 minutes ago"`.
///
/// A unit is used only once more than one whole unit has elapsed, so exactly
/// one hour still reads as `"60 minutes ago"`. Unparsable input is returned
/// unchanged; future timestamps read as zero seconds.
#[must_use]
pub fn time_since(created_at: &str, now: OffsetDateTime) -> String {
    let Some(at) = parse_timestamp(created_at, now) else {
        return created_at.to_owned();
    };
    let seconds = (now - at).whole_seconds().max(0);
    for (unit_secs, unit) in [
        (YEAR_SECS, "years"),
        (MONTH_SECS, "months"),
        (DAY_SECS, "days"),
        (HOUR_SECS, "hours"),
        (MINUTE_SECS, "minutes"),
    ] {
        if seconds > unit_secs {
            return format!("{} {unit} ago", seconds / unit_secs);
        }
    }
    format!("{seconds} seconds ago")
}

/// `"1.2M views"`, `"3.4K views"` or `"999 views"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_view_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M views", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K views", count as f64 / 1_000.0)
    } else {
        format!("{count} views")
    }
}
