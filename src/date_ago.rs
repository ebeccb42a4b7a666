//! "3 days ago" style labels for `DD.MM.YYYY` publish dates.

use chrono::{DateTime, NaiveDate, Utc};

const JUST_NOW_THRESHOLD_SECS: i64 = 29;

const INTERVALS: [(&str, i64); 7] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("min", 60),
    ("sec", 1),
];

/// Parses `DD.MM.YYYY` as midnight UTC of that day.
pub fn parse_display_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%d.%m.%Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Largest whole unit elapsed between `value` and `now`. Anything under half a
/// minute, including dates in the future, is "Just now". Input that is not a
/// `DD.MM.YYYY` date comes back unchanged.
pub fn format_date_ago(value: &str, now: DateTime<Utc>) -> String {
    let Some(published) = parse_display_date(value) else {
        return value.to_string();
    };

    let seconds = (now - published).num_seconds();
    if seconds < JUST_NOW_THRESHOLD_SECS {
        return "Just now".to_string();
    }

    for (unit, unit_secs) in INTERVALS {
        let count = seconds / unit_secs;
        if count == 1 {
            return format!("1 {unit} ago");
        }
        if count > 1 {
            return format!("{count} {unit}s ago");
        }
    }

    value.to_string()
}
