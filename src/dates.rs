//! Date helpers for history queries and chart labels.
//!
//! Timestamps from the api are RFC 3339. Labels are rendered in the offset
//! the timestamp carries; anything that does not parse is echoed back as-is.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Utc};

use crate::domain::{ChartInterval, ChartRange, LiveRange};

/// Look-back windows offered by the dashboard and history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    OneHour,
    EightHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl Window {
    pub fn duration(&self) -> Duration {
        match self {
            Window::OneHour => Duration::hours(1),
            Window::EightHours => Duration::hours(8),
            Window::OneDay => Duration::hours(24),
            Window::SevenDays => Duration::days(7),
            Window::ThirtyDays => Duration::days(30),
        }
    }
}

impl From<LiveRange> for Window {
    fn from(range: LiveRange) -> Self {
        match range {
            LiveRange::OneHour => Window::OneHour,
            LiveRange::EightHours => Window::EightHours,
            LiveRange::OneDay => Window::OneDay,
        }
    }
}

impl From<ChartRange> for Window {
    fn from(range: ChartRange) -> Self {
        match range {
            ChartRange::OneDay => Window::OneDay,
            ChartRange::SevenDays => Window::SevenDays,
            ChartRange::ThirtyDays => Window::ThirtyDays,
        }
    }
}

/// `(startDate, endDate)` ending at `now`, as ISO strings with milliseconds.
pub fn date_range(window: Window, now: DateTime<Utc>) -> (String, String) {
    let start = now - window.duration();
    (iso(start), iso(now))
}

pub fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp).ok()
}

fn format_or_echo(timestamp: &str, pattern: &str) -> String {
    parse(timestamp)
        .map(|at| at.format(pattern).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// "Jan 15, 2024 14:30"
pub fn format_date_time(timestamp: &str) -> String {
    format_or_echo(timestamp, "%b %d, %Y %H:%M")
}

/// "2024-01-15"
pub fn format_date(timestamp: &str) -> String {
    format_or_echo(timestamp, "%Y-%m-%d")
}

/// "14:30"
pub fn format_time(timestamp: &str) -> String {
    format_or_echo(timestamp, "%H:%M")
}

/// Axis label: time of day for hourly buckets, month and day for daily ones.
pub fn chart_label(timestamp: &str, interval: ChartInterval) -> String {
    match interval {
        ChartInterval::OneHour | ChartInterval::FourHours => format_time(timestamp),
        ChartInterval::OneDay => format_or_echo(timestamp, "%b %d"),
    }
}

/// "just now", "5 minutes ago", "2 hours ago", "3 days ago"
pub fn relative(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(at) = parse(timestamp) else {
        return timestamp.to_string();
    };

    let elapsed = now.signed_duration_since(at.with_timezone(&Utc));
    let (count, unit) = if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    } else if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };

    let plural = if count == 1 { "" } else { "s" };
    format!("{} {}{} ago", count, unit, plural)
}
