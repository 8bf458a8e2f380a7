//! Human-readable rendering of stored timestamps.

use crate::error::{Result, VaultError};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

const DISPLAY_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// Render an ISO-8601 timestamp in the local time zone,
/// e.g. `October 19, 2026 at 3:05 PM`.
pub fn format_date(iso: &str) -> Result<String> {
    format_date_in(iso, &Local)
}

/// Render an ISO-8601 timestamp in the given time zone.
pub fn format_date_in<Tz>(iso: &str, tz: &Tz) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let parsed = DateTime::parse_from_rfc3339(iso.trim())
        .map_err(|_| VaultError::InvalidTimestamp(iso.to_string()))?;
    Ok(parsed
        .with_timezone(tz)
        .format(DISPLAY_FORMAT)
        .to_string())
}
