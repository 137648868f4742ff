//! Working-hours validation across participant timezones.
//!
//! # Responsibility
//! - Produce one `TimezoneVerdict` per requested timezone.
//! - Aggregate working-hours failures and report the first offender.
//!
//! # Invariants
//! - Timezones are checked in input order.
//! - Unknown timezones and ordering failures abort immediately.
//! - Working-hours failures never abort; they are collected and reported
//!   once every timezone has been checked.

use super::interval::{check_local_ordering, check_ordering};
use super::timezone::{format_hhmm, minute_of_day, resolve_timezone, to_local};
use super::window::WorkingWindow;
use super::{ScheduleError, ScheduleResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of checking one timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneVerdict {
    pub timezone: String,
    /// Local start rendered as `HH:MM`.
    pub start_local: String,
    /// Local end rendered as `HH:MM`.
    pub end_local: String,
    pub start_minute: u32,
    pub end_minute: u32,
    pub within_working_hours: bool,
}

/// Aggregated working-hours rejection.
///
/// Always carries at least one failing verdict: the first one in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutsideWorkingHours {
    window: WorkingWindow,
    first: TimezoneVerdict,
    additional: Vec<TimezoneVerdict>,
}

impl OutsideWorkingHours {
    fn from_failures(window: WorkingWindow, failures: Vec<TimezoneVerdict>) -> Option<Self> {
        let mut failures = failures.into_iter();
        let first = failures.next()?;
        Some(Self {
            window,
            first,
            additional: failures.collect(),
        })
    }

    pub fn window(&self) -> WorkingWindow {
        self.window
    }

    /// First failing timezone in input order.
    pub fn first_failure(&self) -> &TimezoneVerdict {
        &self.first
    }

    /// Every failing verdict, first offender first.
    pub fn failures(&self) -> impl Iterator<Item = &TimezoneVerdict> {
        std::iter::once(&self.first).chain(self.additional.iter())
    }

    pub fn failure_count(&self) -> usize {
        1 + self.additional.len()
    }

    pub fn has_multiple_failures(&self) -> bool {
        !self.additional.is_empty()
    }
}

impl Display for OutsideWorkingHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let first = &self.first;
        write!(
            f,
            "appointment time is outside working hours ({}) for timezone(s): {} ({}: start={}, end={})",
            self.window, first.timezone, first.timezone, first.start_local, first.end_local
        )?;
        if self.has_multiple_failures() {
            write!(
                f,
                ". Please choose a time that works for all participants' timezones"
            )?;
        }
        Ok(())
    }
}

impl Error for OutsideWorkingHours {}

/// Checks proposed intervals against a configured working window.
///
/// Stateless apart from the window; safe to share across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkingHoursValidator {
    window: WorkingWindow,
}

impl WorkingHoursValidator {
    pub fn new(window: WorkingWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> WorkingWindow {
        self.window
    }

    /// Computes the verdict for one timezone without any ordering check.
    ///
    /// # Errors
    /// - `InvalidTimezone` when `timezone` does not resolve.
    pub fn verdict(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: &str,
    ) -> ScheduleResult<TimezoneVerdict> {
        let tz = resolve_timezone(timezone)?;
        let start_local = to_local(start, tz);
        let end_local = to_local(end, tz);
        let start_minute = minute_of_day(&start_local);
        let end_minute = minute_of_day(&end_local);

        Ok(TimezoneVerdict {
            timezone: timezone.to_string(),
            start_local: format_hhmm(&start_local),
            end_local: format_hhmm(&end_local),
            start_minute,
            end_minute,
            within_working_hours: self.window.contains(start_minute)
                && self.window.contains(end_minute),
        })
    }

    /// Runs the ordering checks and returns one verdict per timezone.
    ///
    /// # Errors
    /// - `InvalidInterval` when `end <= start`, checked before any timezone.
    /// - `InvalidTimezone` for the first unresolvable identifier.
    /// - `InvalidInterval` naming the first timezone whose local end
    ///   minute-of-day is not after the local start minute-of-day.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezones: &[S],
    ) -> ScheduleResult<Vec<TimezoneVerdict>> {
        check_ordering(&start, &end)?;

        let mut verdicts = Vec::with_capacity(timezones.len());
        for timezone in timezones {
            let verdict = self.verdict(start, end, timezone.as_ref())?;
            check_local_ordering(&verdict.timezone, verdict.start_minute, verdict.end_minute)?;
            verdicts.push(verdict);
        }
        Ok(verdicts)
    }

    /// Accepts the interval only if it is well-formed and inside the working
    /// window for every timezone in `timezones`.
    ///
    /// # Errors
    /// - Everything `evaluate` returns.
    /// - `OutsideWorkingHours` identifying the first failing timezone.
    pub fn validate_all_participants<S: AsRef<str>>(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezones: &[S],
    ) -> ScheduleResult<()> {
        let failures = self
            .evaluate(start, end, timezones)?
            .into_iter()
            .filter(|verdict| !verdict.within_working_hours)
            .collect::<Vec<_>>();

        match OutsideWorkingHours::from_failures(self.window, failures) {
            Some(rejection) => Err(ScheduleError::OutsideWorkingHours(rejection)),
            None => Ok(()),
        }
    }
}
