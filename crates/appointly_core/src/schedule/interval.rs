//! Interval ordering checks.
//!
//! # Invariants
//! - Zero-length intervals are rejected: `end` must be strictly after `start`.
//! - The local check compares minutes-of-day only, so it also rejects
//!   intervals whose local end wraps past midnight.

use super::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ordering failure, either on the UTC instants or in one timezone's view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidInterval {
    /// `None` for the global UTC check.
    pub timezone: Option<String>,
}

impl InvalidInterval {
    pub fn global() -> Self {
        Self { timezone: None }
    }

    pub fn in_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: Some(timezone.into()),
        }
    }
}

impl Display for InvalidInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.timezone {
            None => write!(f, "end time must be after start time"),
            Some(tz) => write!(f, "end time must be after start time for timezone: {tz}"),
        }
    }
}

impl Error for InvalidInterval {}

/// Fails with `InvalidInterval` unless `end > start`.
pub fn check_ordering<T: PartialOrd>(start: &T, end: &T) -> ScheduleResult<()> {
    if end <= start {
        return Err(ScheduleError::InvalidInterval(InvalidInterval::global()));
    }
    Ok(())
}

/// Per-timezone recheck on local minutes-of-day.
pub(crate) fn check_local_ordering(
    timezone: &str,
    start_minute: u32,
    end_minute: u32,
) -> ScheduleResult<()> {
    if end_minute <= start_minute {
        return Err(ScheduleError::InvalidInterval(InvalidInterval::in_timezone(
            timezone,
        )));
    }
    Ok(())
}
