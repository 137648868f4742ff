//! Process configuration loaded from the environment.
//!
//! # Responsibility
//! - Read `APPOINTLY_*` variables (optionally seeded from `.env`).
//! - Apply defaults for missing keys and reject malformed values.
//!
//! # Invariants
//! - A missing key always takes its default.
//! - A present but malformed key is an error, never silently defaulted.
//! - `log_dir` is always absolute; relative values are joined onto the
//!   working directory.

use crate::logging::default_log_level;
use crate::schedule::{resolve_timezone, WindowError, WorkingWindow};
use crate::schedule::window::{DEFAULT_WORKING_HOUR_END, DEFAULT_WORKING_HOUR_START};
use crate::service::appointment_service::TimezoneScope;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_VAR: &str = "APPOINTLY_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "APPOINTLY_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "APPOINTLY_LOG_DIR";
pub const WORKING_HOUR_START_VAR: &str = "APPOINTLY_WORKING_HOUR_START";
pub const WORKING_HOUR_END_VAR: &str = "APPOINTLY_WORKING_HOUR_END";
pub const DEFAULT_TIMEZONE_VAR: &str = "APPOINTLY_DEFAULT_TIMEZONE";
pub const TIMEZONE_SCOPE_VAR: &str = "APPOINTLY_TIMEZONE_SCOPE";

const DEFAULT_DB_PATH: &str = "appointly.sqlite3";
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";

/// Configuration value rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidWindow(WindowError),
    InvalidTimezone { key: &'static str, value: String },
    InvalidScope(String),
    /// The working directory needed to resolve a relative path is unavailable.
    WorkingDirectory(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a whole number, got `{value}`")
            }
            Self::InvalidWindow(err) => write!(f, "invalid working hours: {err}"),
            Self::InvalidTimezone { key, value } => {
                write!(f, "{key} is not a known timezone: `{value}`")
            }
            Self::InvalidScope(value) => write!(
                f,
                "{TIMEZONE_SCOPE_VAR} must be `creator` or `participants`, got `{value}`"
            ),
            Self::WorkingDirectory(err) => {
                write!(f, "cannot resolve relative {LOG_DIR_VAR}: {err}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidWindow(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WindowError> for ConfigError {
    fn from(value: WindowError) -> Self {
        Self::InvalidWindow(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub working_window: WorkingWindow,
    /// Preferred timezone for users created without one.
    pub default_timezone: String,
    pub timezone_scope: TimezoneScope,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            working_window: WorkingWindow::default(),
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            timezone_scope: TimezoneScope::default(),
        }
    }
}

impl AppConfig {
    /// Loads from the process environment after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads from an arbitrary key lookup. Blank values count as missing.
    ///
    /// A relative log directory is resolved against the current working
    /// directory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let needs_base = lookup(LOG_DIR_VAR)
            .map(|value| Path::new(value.trim()).is_relative())
            .unwrap_or(false);
        let base = if needs_base {
            env::current_dir().map_err(|err| ConfigError::WorkingDirectory(err.to_string()))?
        } else {
            PathBuf::new()
        };
        Self::from_lookup_in(lookup, &base)
    }

    /// Same as `from_lookup`, resolving a relative log directory under `base`.
    pub fn from_lookup_in<F>(lookup: F, base: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let start_hour = parse_hour(WORKING_HOUR_START_VAR, get(WORKING_HOUR_START_VAR))?
            .unwrap_or(DEFAULT_WORKING_HOUR_START);
        let end_hour = parse_hour(WORKING_HOUR_END_VAR, get(WORKING_HOUR_END_VAR))?
            .unwrap_or(DEFAULT_WORKING_HOUR_END);

        let default_timezone = match get(DEFAULT_TIMEZONE_VAR) {
            Some(value) => {
                resolve_timezone(&value).map_err(|_| ConfigError::InvalidTimezone {
                    key: DEFAULT_TIMEZONE_VAR,
                    value: value.clone(),
                })?;
                value
            }
            None => defaults.default_timezone,
        };

        let timezone_scope = match get(TIMEZONE_SCOPE_VAR) {
            Some(value) => value
                .parse::<TimezoneScope>()
                .map_err(ConfigError::InvalidScope)?,
            None => defaults.timezone_scope,
        };

        Ok(Self {
            db_path: get(DB_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.db_path),
            log_level: get(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: get(LOG_DIR_VAR).map(|dir| base.join(dir)),
            working_window: WorkingWindow::from_hours(start_hour, end_hour)?,
            default_timezone,
            timezone_scope,
        })
    }
}

fn parse_hour(key: &'static str, value: Option<String>) -> Result<Option<u32>, ConfigError> {
    value
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        })
        .transpose()
}
