//! User use-case service.
//!
//! # Responsibility
//! - Create, update, read, list and remove scheduling users.
//! - Fill in the configured default timezone when none is given.
//!
//! # Invariants
//! - Preferred timezones are resolved before anything is persisted.
//! - A user who still owns appointments cannot be removed.

use crate::model::user::{User, UserId, UserValidationError};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::schedule::resolve_timezone;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    Validation(UserValidationError),
    UserNotFound(UserId),
    DuplicateUsername(String),
    /// The user is still the creator of `count` appointments.
    UserHasAppointments { user_id: UserId, count: u64 },
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateUsername(name) => write!(f, "username already taken: {name}"),
            Self::UserHasAppointments { user_id, count } => write!(
                f,
                "user {user_id} still created {count} appointment(s); delete them first"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::DuplicateUsername(name) => Self::DuplicateUsername(name),
            RepoError::UserValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for UserServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for `UserService::create_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    /// Falls back to the service default when `None`.
    pub preferred_timezone: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub preferred_timezone: Option<String>,
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
    default_timezone: String,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R, default_timezone: impl Into<String>) -> Self {
        Self {
            repo,
            default_timezone: default_timezone.into(),
        }
    }

    pub fn create_user(&self, request: &CreateUserRequest) -> Result<User, UserServiceError> {
        let timezone = request
            .preferred_timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(self.default_timezone.as_str());
        ensure_timezone(timezone)?;

        let user = User::new(request.name.trim(), request.username.trim(), timezone);
        self.repo.create_user(&user)?;
        info!(
            "event=user_create module=service status=ok user_id={} timezone={}",
            user.id, user.preferred_timezone
        );
        Ok(user)
    }

    pub fn update_user(
        &self,
        id: UserId,
        request: &UpdateUserRequest,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get_user(id)?;
        if let Some(name) = &request.name {
            user.name = name.trim().to_string();
        }
        if let Some(username) = &request.username {
            user.username = username.trim().to_string();
        }
        if let Some(timezone) = &request.preferred_timezone {
            let timezone = timezone.trim();
            ensure_timezone(timezone)?;
            user.preferred_timezone = timezone.to_string();
        }

        self.repo.update_user(&user)?;
        info!("event=user_update module=service status=ok user_id={id}");
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.repo
            .get_user(id)?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    pub fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.list_users()?)
    }

    /// Removes a user who owns no appointments.
    pub fn delete_user(&self, id: UserId) -> Result<(), UserServiceError> {
        let count = self.repo.count_created_appointments(id)?;
        if count > 0 {
            warn!(
                "event=user_delete module=service status=rejected user_id={id} created_appointments={count}"
            );
            return Err(UserServiceError::UserHasAppointments { user_id: id, count });
        }
        match self.repo.delete_user(id) {
            Ok(()) => {}
            // An appointment was created after the count above.
            Err(RepoError::UserStillReferenced(user_id)) => {
                let count = self.repo.count_created_appointments(user_id)?.max(1);
                warn!(
                    "event=user_delete module=service status=rejected user_id={id} created_appointments={count}"
                );
                return Err(UserServiceError::UserHasAppointments { user_id, count });
            }
            Err(err) => return Err(err.into()),
        }
        info!("event=user_delete module=service status=ok user_id={id}");
        Ok(())
    }
}

fn ensure_timezone(id: &str) -> Result<(), UserValidationError> {
    resolve_timezone(id)
        .map(|_| ())
        .map_err(|_| UserValidationError::InvalidTimezone(id.to_string()))
}
