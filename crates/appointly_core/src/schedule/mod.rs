//! Timezone-aware scheduling validation core.
//!
//! # Responsibility
//! - Resolve IANA timezone identifiers and convert instants to wall clock.
//! - Check interval ordering globally and per local timezone view.
//! - Check working-hours constraints for every requested timezone.
//! - Parse creator wall-clock input into canonical UTC instants.
//!
//! # Invariants
//! - Everything in this module is pure: no I/O, no logging, no shared state.
//! - Diagnostics are structured values; text is produced only by `Display`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod interval;
pub mod parse;
pub mod timezone;
pub mod window;
pub mod working_hours;

pub use interval::{check_ordering, InvalidInterval};
pub use parse::{parse_wall_clock, ParseTier, WallClockParseError};
pub use timezone::{format_hhmm, format_in_timezone, minute_of_day, resolve_timezone, to_local};
pub use window::{WindowError, WorkingWindow};
pub use working_hours::{OutsideWorkingHours, TimezoneVerdict, WorkingHoursValidator};

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Failure taxonomy of the validation core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Identifier does not resolve in the timezone database. Aborts the call.
    InvalidTimezone(String),
    /// End is not strictly after start. Aborts the call.
    InvalidInterval(InvalidInterval),
    /// One or more timezones see the interval outside the working window.
    OutsideWorkingHours(OutsideWorkingHours),
}

impl ScheduleError {
    /// Stable machine-readable code for this failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimezone(_) => "invalid_timezone",
            Self::InvalidInterval(_) => "invalid_interval",
            Self::OutsideWorkingHours(_) => "outside_working_hours",
        }
    }
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimezone(id) => write!(f, "invalid timezone: {id}"),
            Self::InvalidInterval(detail) => write!(f, "{detail}"),
            Self::OutsideWorkingHours(detail) => write!(f, "{detail}"),
        }
    }
}

impl Error for ScheduleError {}

impl From<InvalidInterval> for ScheduleError {
    fn from(value: InvalidInterval) -> Self {
        Self::InvalidInterval(value)
    }
}

impl From<OutsideWorkingHours> for ScheduleError {
    fn from(value: OutsideWorkingHours) -> Self {
        Self::OutsideWorkingHours(value)
    }
}
