//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repository APIs return semantic errors (`*NotFound`, `DuplicateUsername`)
//!   in addition to DB transport errors.

use crate::db::DbError;
use crate::model::appointment::{AppointmentId, AppointmentValidationError};
use crate::model::user::{UserId, UserValidationError};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod appointment_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user and appointment persistence.
#[derive(Debug)]
pub enum RepoError {
    UserValidation(UserValidationError),
    AppointmentValidation(AppointmentValidationError),
    Db(DbError),
    UserNotFound(UserId),
    AppointmentNotFound(AppointmentId),
    DuplicateUsername(String),
    /// Delete blocked because other rows still reference the user.
    UserStillReferenced(UserId),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::AppointmentValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::AppointmentNotFound(id) => write!(f, "appointment not found: {id}"),
            Self::DuplicateUsername(name) => write!(f, "username already taken: {name}"),
            Self::UserStillReferenced(id) => {
                write!(f, "user {id} is still referenced by appointments")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UserValidation(err) => Some(err),
            Self::AppointmentValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<AppointmentValidationError> for RepoError {
    fn from(value: AppointmentValidationError) -> Self {
        Self::AppointmentValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn millis_to_utc(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}
