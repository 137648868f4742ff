//! User domain model.
//!
//! # Invariants
//! - `name` and `username` are non-empty after trimming.
//! - `preferred_timezone` resolves in the timezone database.

use crate::schedule::{resolve_timezone, ScheduleError};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;

/// Record-level validation failure for `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    EmptyUsername,
    InvalidTimezone(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "user name cannot be empty"),
            Self::EmptyUsername => write!(f, "username cannot be empty"),
            Self::InvalidTimezone(id) => write!(f, "invalid preferred timezone: {id}"),
        }
    }
}

impl Error for UserValidationError {}

/// Scheduling participant with a preferred local timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    /// IANA identifier, e.g. `Asia/Jakarta`.
    pub preferred_timezone: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with a generated id and `created_at = now`.
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        preferred_timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            username: username.into(),
            preferred_timezone: preferred_timezone.into(),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if self.username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        resolve_timezone(&self.preferred_timezone).map_err(|err| match err {
            ScheduleError::InvalidTimezone(id) => UserValidationError::InvalidTimezone(id),
            other => UserValidationError::InvalidTimezone(other.to_string()),
        })?;
        Ok(())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            preferred_timezone: self.preferred_timezone.clone(),
        }
    }
}

/// Public projection of a user embedded in appointment views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub preferred_timezone: String,
}
