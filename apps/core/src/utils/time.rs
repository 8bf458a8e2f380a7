//! Timestamp helpers.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Millisecond precision with a `Z` suffix keeps stored timestamps
/// lexicographically ordered and identical in shape to what the browser
/// vault wrote.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
