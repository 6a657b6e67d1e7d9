//! Human-readable durations, countdowns and clock times.

use chrono::{DateTime, Local, TimeZone, Utc};

/// `2h 7m`, `45m`, `2h`, or `Now` for zero or less.
pub fn format_duration(minutes: i64) -> String {
    if minutes <= 0 {
        return "Now".into();
    }
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// `H:MM:SS` from an hour up, `M:SS` below, `0:00` once elapsed.
pub fn format_countdown(total_secs: i64) -> String {
    if total_secs <= 0 {
        return "0:00".into();
    }
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// `HH:MM` in the local time zone.
pub fn format_clock(at: DateTime<Utc>) -> String {
    format_clock_in(at, &Local)
}

pub fn format_clock_in<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}
