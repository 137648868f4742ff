//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Usernames are unique; violations surface as `DuplicateUsername`.
//! - Deleting a user cascades to their participant links only.

use super::{ensure_tables, millis_to_utc, parse_uuid, RepoError, RepoResult};
use crate::model::user::{User, UserId};
use rusqlite::{params, Connection, ErrorCode, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    username,
    preferred_timezone,
    created_at
FROM users";

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Lists users ordered by username.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Removes the user and their participant links.
    ///
    /// Fails with `UserStillReferenced` while the user created appointments.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
    /// Number of appointments created by `id`.
    fn count_created_appointments(&self, id: UserId) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "appointments"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (uuid, name, username, preferred_timezone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    user.id.to_string(),
                    user.name.trim(),
                    user.username.trim(),
                    user.preferred_timezone.as_str(),
                    user.created_at.timestamp_millis(),
                ],
            )
            .map_err(|err| map_unique_violation(err, &user.username))?;

        Ok(user.id)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE users
                 SET name = ?1, username = ?2, preferred_timezone = ?3
                 WHERE uuid = ?4;",
                params![
                    user.name.trim(),
                    user.username.trim(),
                    user.preferred_timezone.as_str(),
                    user.id.to_string(),
                ],
            )
            .map_err(|err| map_unique_violation(err, &user.username))?;

        if changed == 0 {
            return Err(RepoError::UserNotFound(user.id));
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY username ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])
            .map_err(|err| map_foreign_key_violation(err, id))?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }

    fn count_created_appointments(&self, id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE creator_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative appointment count {count}")))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let user = User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        name: row.get("name")?,
        username: row.get("username")?,
        preferred_timezone: row.get("preferred_timezone")?,
        created_at: millis_to_utc(row.get("created_at")?, "users.created_at")?,
    };
    user.validate()?;
    Ok(user)
}

fn map_unique_violation(err: rusqlite::Error, username: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateUsername(username.trim().to_string())
        }
        _ => err.into(),
    }
}

fn map_foreign_key_violation(err: rusqlite::Error, id: UserId) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepoError::UserStillReferenced(id)
        }
        _ => err.into(),
    }
}
