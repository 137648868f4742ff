//! Timezone resolution and wall-clock conversion helpers.
//!
//! # Invariants
//! - Resolution is a pure lookup in the bundled IANA database.
//! - Identifiers are matched verbatim; surrounding whitespace is not trimmed.

use super::{ScheduleError, ScheduleResult};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt::Display;

const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HHMM_FORMAT: &str = "%H:%M";

/// Resolves an IANA timezone identifier such as `Asia/Jakarta`.
///
/// # Errors
/// - `InvalidTimezone` for empty or unknown identifiers.
pub fn resolve_timezone(id: &str) -> ScheduleResult<Tz> {
    if id.is_empty() {
        return Err(ScheduleError::InvalidTimezone(id.to_string()));
    }
    id.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(id.to_string()))
}

/// Converts a UTC instant to wall-clock time in `tz`.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Minutes since local midnight (`hour * 60 + minute`); seconds are ignored.
pub fn minute_of_day<T: Timelike>(time: &T) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Renders `HH:MM` in 24-hour clock.
pub fn format_hhmm<Z>(local: &DateTime<Z>) -> String
where
    Z: TimeZone,
    Z::Offset: Display,
{
    local.format(HHMM_FORMAT).to_string()
}

/// Renders `instant` as `YYYY-MM-DD HH:MM:SS` in the timezone named by `id`.
pub fn format_in_timezone(instant: DateTime<Utc>, id: &str) -> ScheduleResult<String> {
    let tz = resolve_timezone(id)?;
    Ok(to_local(instant, tz)
        .format(LOCAL_DATETIME_FORMAT)
        .to_string())
}
