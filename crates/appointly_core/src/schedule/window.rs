//! Working-hours window configuration value.
//!
//! # Responsibility
//! - Describe the local wall-clock window appointments must fall into.
//! - Render the window for diagnostics (`09:00-17:00`).
//!
//! # Invariants
//! - Bounds are minutes-of-day, inclusive at both ends.
//! - `start_minute < end_minute <= 24 * 60`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

/// Default window start hour (09:00 local).
pub const DEFAULT_WORKING_HOUR_START: u32 = 9;
/// Default window end hour (17:00 local, inclusive).
pub const DEFAULT_WORKING_HOUR_END: u32 = 17;

/// Rejected window bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// A bound lies beyond the end of the day.
    OutOfRange { minute: u32 },
    /// Start is not strictly before end.
    Empty { start_minute: u32, end_minute: u32 },
}

impl Display for WindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { minute } => write!(
                f,
                "working window bound {minute} is outside 0..={MINUTES_PER_DAY} minutes"
            ),
            Self::Empty {
                start_minute,
                end_minute,
            } => write!(
                f,
                "working window start {} must be before end {}",
                format_minute_of_day(*start_minute),
                format_minute_of_day(*end_minute)
            ),
        }
    }
}

impl Error for WindowError {}

/// Inclusive local working window, expressed in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkingWindow")]
pub struct WorkingWindow {
    start_minute: u32,
    end_minute: u32,
}

/// Unchecked wire form; converted through `WorkingWindow::from_minutes`.
#[derive(Deserialize)]
struct RawWorkingWindow {
    start_minute: u32,
    end_minute: u32,
}

impl TryFrom<RawWorkingWindow> for WorkingWindow {
    type Error = WindowError;

    fn try_from(raw: RawWorkingWindow) -> Result<Self, Self::Error> {
        Self::from_minutes(raw.start_minute, raw.end_minute)
    }
}

impl WorkingWindow {
    /// Builds a window from whole hours, e.g. `from_hours(9, 17)`.
    pub fn from_hours(start_hour: u32, end_hour: u32) -> Result<Self, WindowError> {
        Self::from_minutes(
            start_hour.saturating_mul(MINUTES_PER_HOUR),
            end_hour.saturating_mul(MINUTES_PER_HOUR),
        )
    }

    /// Builds a window from minutes-of-day bounds.
    ///
    /// # Errors
    /// - `OutOfRange` when a bound exceeds one day.
    /// - `Empty` when `start_minute >= end_minute`.
    pub fn from_minutes(start_minute: u32, end_minute: u32) -> Result<Self, WindowError> {
        for minute in [start_minute, end_minute] {
            if minute > MINUTES_PER_DAY {
                return Err(WindowError::OutOfRange { minute });
            }
        }
        if start_minute >= end_minute {
            return Err(WindowError::Empty {
                start_minute,
                end_minute,
            });
        }
        Ok(Self {
            start_minute,
            end_minute,
        })
    }

    pub fn start_minute(&self) -> u32 {
        self.start_minute
    }

    pub fn end_minute(&self) -> u32 {
        self.end_minute
    }

    /// Returns whether `minute_of_day` lies inside the window, bounds included.
    pub fn contains(&self, minute_of_day: u32) -> bool {
        (self.start_minute..=self.end_minute).contains(&minute_of_day)
    }
}

impl Default for WorkingWindow {
    fn default() -> Self {
        Self {
            start_minute: DEFAULT_WORKING_HOUR_START * MINUTES_PER_HOUR,
            end_minute: DEFAULT_WORKING_HOUR_END * MINUTES_PER_HOUR,
        }
    }
}

impl Display for WorkingWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minute_of_day(self.start_minute),
            format_minute_of_day(self.end_minute)
        )
    }
}

fn format_minute_of_day(minute: u32) -> String {
    format!(
        "{:02}:{:02}",
        minute / MINUTES_PER_HOUR,
        minute % MINUTES_PER_HOUR
    )
}

#[cfg(test)]
mod tests {
    use super::{WindowError, WorkingWindow};

    #[test]
    fn default_window_is_nine_to_five() {
        let window = WorkingWindow::default();
        assert_eq!(window.start_minute(), 540);
        assert_eq!(window.end_minute(), 1020);
        assert_eq!(window.to_string(), "09:00-17:00");
    }

    #[test]
    fn contains_is_inclusive_at_both_bounds() {
        let window = WorkingWindow::default();
        assert!(!window.contains(539));
        assert!(window.contains(540));
        assert!(window.contains(1020));
        assert!(!window.contains(1021));
    }

    #[test]
    fn rejects_empty_and_out_of_range_windows() {
        assert_eq!(
            WorkingWindow::from_hours(17, 9).unwrap_err(),
            WindowError::Empty {
                start_minute: 1020,
                end_minute: 540
            }
        );
        assert!(matches!(
            WorkingWindow::from_hours(8, 25),
            Err(WindowError::OutOfRange { minute: 1500 })
        ));
    }

    #[test]
    fn deserialization_applies_bound_checks() {
        let window: WorkingWindow =
            serde_json::from_str(r#"{"start_minute":480,"end_minute":960}"#).unwrap();
        assert_eq!(window.to_string(), "08:00-16:00");

        assert!(serde_json::from_str::<WorkingWindow>(r#"{"start_minute":2000,"end_minute":5}"#)
            .unwrap_err()
            .to_string()
            .contains("outside"));
        assert!(
            serde_json::from_str::<WorkingWindow>(r#"{"start_minute":600,"end_minute":600}"#)
                .is_err()
        );
    }

    #[test]
    fn serialized_window_reads_back() {
        let window = WorkingWindow::from_hours(7, 15).unwrap();
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start_minute":420,"end_minute":900}"#);
        assert_eq!(serde_json::from_str::<WorkingWindow>(&json).unwrap(), window);
    }

    #[test]
    fn custom_window_renders_with_minutes() {
        let window = WorkingWindow::from_minutes(7 * 60 + 30, 15 * 60 + 45).unwrap();
        assert_eq!(window.to_string(), "07:30-15:45");
    }
}
