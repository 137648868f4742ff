//! Appointment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist appointments together with their participant links.
//! - Answer participant-scoped listing queries.
//!
//! # Invariants
//! - Create and delete touch `appointments` and `appointment_participants`
//!   in one transaction.
//! - Participant order is preserved through the `position` column.
//! - Listings are sorted by `start_at ASC, uuid ASC`.

use super::{ensure_tables, millis_to_utc, parse_uuid, RepoError, RepoResult};
use crate::model::appointment::{Appointment, AppointmentId};
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row};

const APPOINTMENT_SELECT_SQL: &str = "SELECT
    a.uuid AS uuid,
    a.title AS title,
    a.creator_uuid AS creator_uuid,
    a.start_at AS start_at,
    a.end_at AS end_at,
    a.created_at AS created_at
FROM appointments a";

/// Repository interface for appointment persistence.
pub trait AppointmentRepository {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId>;
    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>>;
    /// Appointments the user participates in, earliest start first.
    fn list_for_participant(&self, user_id: UserId) -> RepoResult<Vec<Appointment>>;
    /// Hard-deletes the appointment and all participant links.
    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<()>;
}

/// SQLite-backed appointment repository.
pub struct SqliteAppointmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppointmentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "appointments", "appointment_participants"])?;
        Ok(Self { conn })
    }

    fn load_participants(&self, appointment_uuid: &str) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid
             FROM appointment_participants
             WHERE appointment_uuid = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([appointment_uuid])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            ids.push(parse_uuid(&text, "appointment_participants.user_uuid")?);
        }
        Ok(ids)
    }

    fn parse_appointment_row(&self, row: &Row<'_>) -> RepoResult<Appointment> {
        let uuid_text: String = row.get("uuid")?;
        let creator_text: String = row.get("creator_uuid")?;
        let appointment = Appointment {
            id: parse_uuid(&uuid_text, "appointments.uuid")?,
            title: row.get("title")?,
            creator_id: parse_uuid(&creator_text, "appointments.creator_uuid")?,
            start: millis_to_utc(row.get("start_at")?, "appointments.start_at")?,
            end: millis_to_utc(row.get("end_at")?, "appointments.end_at")?,
            participant_ids: self.load_participants(&uuid_text)?,
            created_at: millis_to_utc(row.get("created_at")?, "appointments.created_at")?,
        };
        appointment.validate()?;
        Ok(appointment)
    }

    fn query_appointments(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> RepoResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(args)?;
        let mut appointments = Vec::new();
        while let Some(row) = rows.next()? {
            appointments.push(self.parse_appointment_row(row)?);
        }
        Ok(appointments)
    }
}

impl AppointmentRepository for SqliteAppointmentRepository<'_> {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId> {
        appointment.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let appointment_uuid = appointment.id.to_string();
        tx.execute(
            "INSERT INTO appointments (uuid, title, creator_uuid, start_at, end_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                appointment_uuid,
                appointment.title.as_str(),
                appointment.creator_id.to_string(),
                appointment.start.timestamp_millis(),
                appointment.end.timestamp_millis(),
                appointment.created_at.timestamp_millis(),
            ],
        )?;
        for (position, user_id) in appointment.participant_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO appointment_participants (appointment_uuid, user_uuid, position)
                 VALUES (?1, ?2, ?3);",
                params![appointment_uuid, user_id.to_string(), position as i64],
            )?;
        }
        tx.commit()?;

        Ok(appointment.id)
    }

    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>> {
        let mut found = self.query_appointments(
            &format!("{APPOINTMENT_SELECT_SQL} WHERE a.uuid = ?1;"),
            [id.to_string()],
        )?;
        Ok(found.pop())
    }

    fn list_for_participant(&self, user_id: UserId) -> RepoResult<Vec<Appointment>> {
        self.query_appointments(
            &format!(
                "{APPOINTMENT_SELECT_SQL}
                 INNER JOIN appointment_participants p ON p.appointment_uuid = a.uuid
                 WHERE p.user_uuid = ?1
                 ORDER BY a.start_at ASC, a.uuid ASC;"
            ),
            [user_id.to_string()],
        )
    }

    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<()> {
        let uuid = id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM appointment_participants WHERE appointment_uuid = ?1;",
            [uuid.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM appointments WHERE uuid = ?1;", [uuid.as_str()])?;
        if changed == 0 {
            // Dropping `tx` rolls back the participant delete.
            return Err(RepoError::AppointmentNotFound(id));
        }
        tx.commit()?;
        Ok(())
    }
}
