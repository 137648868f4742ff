//! Two-tier wall-clock parser for appointment input.
//!
//! Input is read as wall-clock time in the creator's timezone. Tiers are
//! tried in order: RFC 3339 first (its offset is discarded, only the
//! calendar fields are kept), then the bare `YYYY-MM-DDTHH:MM:SS` form.
//!
//! # Invariants
//! - Sub-second precision is dropped by both tiers.
//! - A local time inside a DST fold resolves to the earlier instant.
//! - A local time inside a DST gap is rejected.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::error::Error;
use std::fmt::{Display, Formatter};

const FALLBACK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const FORMAT_EXAMPLE: &str = "2024-01-15T09:00:00";
/// Byte offset of the date/time separator in `YYYY-MM-DDTHH:MM:SS`.
const SEPARATOR_INDEX: usize = 10;

/// Parse attempt stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    /// RFC 3339 with explicit offset.
    Structured,
    /// Offset-less `YYYY-MM-DDTHH:MM:SS`.
    Fallback,
}

impl ParseTier {
    fn next(self) -> Option<Self> {
        match self {
            Self::Structured => Some(Self::Fallback),
            Self::Fallback => None,
        }
    }

    fn attempt(self, input: &str) -> Option<NaiveDateTime> {
        let parsed = match self {
            Self::Structured => {
                if !has_t_separator(input) {
                    return None;
                }
                DateTime::parse_from_rfc3339(input)
                    .ok()
                    .map(|dt| dt.naive_local())
            }
            Self::Fallback => NaiveDateTime::parse_from_str(input, FALLBACK_FORMAT).ok(),
        }?;
        parsed.with_nanosecond(0)
    }
}

// chrono's RFC 3339 reader also takes a space or lowercase `t` here.
fn has_t_separator(input: &str) -> bool {
    input.as_bytes().get(SEPARATOR_INDEX) == Some(&b'T')
}

/// Wall-clock input could not be turned into an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallClockParseError {
    /// Neither tier accepted the input.
    Unrecognized { input: String },
    /// The wall-clock time is skipped by a DST transition in `timezone`.
    NonexistentLocalTime { input: String, timezone: String },
}

impl Display for WallClockParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrecognized { input } => write!(
                f,
                "unrecognized time `{input}`; use format: {FORMAT_EXAMPLE}"
            ),
            Self::NonexistentLocalTime { input, timezone } => {
                write!(f, "time `{input}` does not exist in timezone {timezone}")
            }
        }
    }
}

impl Error for WallClockParseError {}

/// Parses `input` as wall-clock time in `tz` and returns the UTC instant.
pub fn parse_wall_clock(input: &str, tz: Tz) -> Result<DateTime<Utc>, WallClockParseError> {
    let (_, naive) = detect(input).ok_or_else(|| WallClockParseError::Unrecognized {
        input: input.to_string(),
    })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| WallClockParseError::NonexistentLocalTime {
            input: input.to_string(),
            timezone: tz.name().to_string(),
        })
}

/// Returns the first tier that accepts `input` with its calendar fields.
pub fn detect(input: &str) -> Option<(ParseTier, NaiveDateTime)> {
    let mut tier = Some(ParseTier::Structured);
    while let Some(current) = tier {
        if let Some(naive) = current.attempt(input) {
            return Some((current, naive));
        }
        tier = current.next();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{detect, parse_wall_clock, ParseTier, WallClockParseError};
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    fn tz(id: &str) -> Tz {
        id.parse().unwrap()
    }

    #[test]
    fn fallback_tier_localizes_in_creator_timezone() {
        let instant = parse_wall_clock("2024-01-15T09:00:00", tz("Asia/Jakarta")).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap());
    }

    #[test]
    fn structured_tier_ignores_embedded_offset() {
        let jakarta = tz("Asia/Jakarta");
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap();
        assert_eq!(
            parse_wall_clock("2024-01-15T09:00:00Z", jakarta).unwrap(),
            expected
        );
        assert_eq!(
            parse_wall_clock("2024-01-15T09:00:00+05:00", jakarta).unwrap(),
            expected
        );
    }

    #[test]
    fn tiers_are_tried_in_order() {
        assert_eq!(
            detect("2024-01-15T09:00:00Z").map(|(tier, _)| tier),
            Some(ParseTier::Structured)
        );
        assert_eq!(
            detect("2024-01-15T09:00:00").map(|(tier, _)| tier),
            Some(ParseTier::Fallback)
        );
        assert_eq!(detect("15/01/2024 09:00"), None);
    }

    #[test]
    fn subsecond_precision_is_dropped() {
        let instant = parse_wall_clock("2024-01-15T09:00:00.750", tz("UTC")).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn exhausting_both_tiers_is_an_error() {
        let err = parse_wall_clock("2024-01-15 09:00", tz("UTC")).unwrap_err();
        assert_eq!(
            err,
            WallClockParseError::Unrecognized {
                input: "2024-01-15 09:00".to_string()
            }
        );
        assert!(err.to_string().contains("2024-01-15T09:00:00"));
    }

    #[test]
    fn date_and_time_must_be_joined_by_uppercase_t() {
        let jakarta = tz("Asia/Jakarta");
        for input in [
            "2024-01-15 09:00:00+07:00",
            "2024-01-15t09:00:00+07:00",
            "2024-01-15 09:00:00",
        ] {
            assert_eq!(
                parse_wall_clock(input, jakarta),
                Err(WallClockParseError::Unrecognized {
                    input: input.to_string()
                })
            );
        }
        assert_eq!(detect("2024-01-15 09:00:00Z"), None);
    }

    #[test]
    fn dst_gap_is_rejected_and_fold_takes_earlier_instant() {
        let new_york = tz("America/New_York");
        assert!(matches!(
            parse_wall_clock("2024-03-10T02:30:00", new_york),
            Err(WallClockParseError::NonexistentLocalTime { .. })
        ));
        assert_eq!(
            parse_wall_clock("2024-11-03T01:30:00", new_york).unwrap(),
            Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap()
        );
    }
}
