//! Timestamp formatting for page stamps

use chrono::{DateTime, Local, TimeZone};

use crate::config::TimestampStyle;

/// Format the current local time with the style's format string
pub fn timestamp_now(style: &TimestampStyle) -> String {
    format_timestamp(&Local::now(), style)
}

/// Format a point in time with the style's format string
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>, style: &TimestampStyle) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(&style.format).to_string()
}
