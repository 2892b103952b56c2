use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

const FRENCH_DATETIME: &str = "%d/%m/%Y %H:%M:%S";

/// Formats a unix timestamp (seconds) as a French date in local time.
pub fn format_date(timestamp: i64) -> String {
    format_date_in(timestamp, &Local)
}

pub fn format_date_in<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(tz).format(FRENCH_DATETIME).to_string(),
        None => timestamp.to_string(),
    }
}
