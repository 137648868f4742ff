//! Appointment use-case service.
//!
//! # Responsibility
//! - Turn creator wall-clock input into validated, persisted appointments.
//! - Project stored appointments into the viewer's timezone.
//! - Enforce participant read access and creator-only deletion.
//!
//! # Invariants
//! - Nothing is persisted unless parsing, ordering and working-hours
//!   validation all succeed.
//! - Which timezones are validated is decided by `TimezoneScope` alone.

use crate::model::appointment::{
    Appointment, AppointmentId, AppointmentValidationError, AppointmentView,
};
use crate::model::user::{User, UserId, UserSummary};
use crate::repo::appointment_repo::AppointmentRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::schedule::{
    check_ordering, format_in_timezone, parse_wall_clock, resolve_timezone, ScheduleError,
    WallClockParseError, WorkingHoursValidator,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which participants' timezones are checked against working hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezoneScope {
    /// Only the creator's timezone. Invitees in other zones are not checked.
    #[default]
    CreatorOnly,
    /// The creator's timezone followed by every distinct invitee timezone.
    AllParticipants,
}

impl TimezoneScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatorOnly => "creator",
            Self::AllParticipants => "participants",
        }
    }
}

impl FromStr for TimezoneScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "creator" | "creator_only" => Ok(Self::CreatorOnly),
            "participants" | "all" | "all_participants" => Ok(Self::AllParticipants),
            other => Err(other.to_string()),
        }
    }
}

/// Service error for appointment use-cases.
#[derive(Debug)]
pub enum AppointmentServiceError {
    CreatorNotFound(UserId),
    /// Calling user does not exist.
    UserNotFound(UserId),
    ParticipantNotFound(UserId),
    InvalidCreatorTimezone(String),
    InvalidStart(WallClockParseError),
    InvalidEnd(WallClockParseError),
    Schedule(ScheduleError),
    Validation(AppointmentValidationError),
    AppointmentNotFound(AppointmentId),
    /// Caller is neither creator nor participant.
    NotParticipant(AppointmentId),
    /// Only the creator may delete.
    NotCreator(AppointmentId),
    Repo(RepoError),
}

impl Display for AppointmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatorNotFound(id) => write!(f, "creator not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::InvalidCreatorTimezone(id) => write!(f, "invalid creator timezone: {id}"),
            Self::InvalidStart(err) => write!(f, "invalid start time: {err}"),
            Self::InvalidEnd(err) => write!(f, "invalid end time: {err}"),
            Self::Schedule(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::AppointmentNotFound(id) => write!(f, "appointment not found: {id}"),
            Self::NotParticipant(id) => {
                write!(f, "you don't have access to appointment {id}")
            }
            Self::NotCreator(id) => {
                write!(f, "only the creator can delete appointment {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppointmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidStart(err) | Self::InvalidEnd(err) => Some(err),
            Self::Schedule(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AppointmentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AppointmentNotFound(id) => Self::AppointmentNotFound(id),
            RepoError::AppointmentValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ScheduleError> for AppointmentServiceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

/// Raw appointment input as typed by the creator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub title: String,
    /// Wall-clock time in the creator's timezone.
    pub start: String,
    pub end: String,
    /// Invitees; the creator is added implicitly.
    #[serde(default)]
    pub participant_ids: Vec<UserId>,
}

/// Appointment service facade over repository implementations.
pub struct AppointmentService<U: UserRepository, A: AppointmentRepository> {
    users: U,
    appointments: A,
    validator: WorkingHoursValidator,
    scope: TimezoneScope,
}

impl<U: UserRepository, A: AppointmentRepository> AppointmentService<U, A> {
    pub fn new(
        users: U,
        appointments: A,
        validator: WorkingHoursValidator,
        scope: TimezoneScope,
    ) -> Self {
        Self {
            users,
            appointments,
            validator,
            scope,
        }
    }

    pub fn validator(&self) -> &WorkingHoursValidator {
        &self.validator
    }

    pub fn scope(&self) -> TimezoneScope {
        self.scope
    }

    /// Validates and stores a new appointment created by `caller`.
    ///
    /// # Errors
    /// - `CreatorNotFound`, `InvalidCreatorTimezone` for a bad caller.
    /// - `InvalidStart` / `InvalidEnd` when both parse tiers fail.
    /// - `ParticipantNotFound` for unknown invitees.
    /// - `Schedule` for ordering, timezone and working-hours failures.
    pub fn create(
        &self,
        caller: UserId,
        request: &CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentServiceError> {
        let creator = self
            .users
            .get_user(caller)?
            .ok_or(AppointmentServiceError::CreatorNotFound(caller))?;
        let creator_tz = resolve_timezone(&creator.preferred_timezone).map_err(|_| {
            AppointmentServiceError::InvalidCreatorTimezone(creator.preferred_timezone.clone())
        })?;

        let start = parse_wall_clock(request.start.trim(), creator_tz)
            .map_err(AppointmentServiceError::InvalidStart)?;
        let end = parse_wall_clock(request.end.trim(), creator_tz)
            .map_err(AppointmentServiceError::InvalidEnd)?;
        debug!(
            "event=appointment_parse module=service status=ok creator_id={caller} timezone={} start_utc={} end_utc={}",
            creator.preferred_timezone,
            start.to_rfc3339(),
            end.to_rfc3339()
        );
        check_ordering(&start, &end)?;

        let invitees = self.load_invitees(&creator, &request.participant_ids)?;
        let timezones = self.timezones_to_check(&creator, &invitees);
        debug!(
            "event=appointment_validate module=service status=start scope={} timezones={}",
            self.scope.as_str(),
            timezones.join(",")
        );
        if let Err(err) = self
            .validator
            .validate_all_participants(start, end, timezones.as_slice())
        {
            warn!(
                "event=appointment_create module=service status=rejected creator_id={caller} code={}",
                err.code()
            );
            return Err(err.into());
        }

        let invitee_ids = invitees.iter().map(|user| user.id).collect::<Vec<_>>();
        let appointment = Appointment::new(request.title.trim(), caller, start, end, &invitee_ids);
        self.appointments.create_appointment(&appointment)?;
        info!(
            "event=appointment_create module=service status=ok appointment_id={} creator_id={caller} participants={}",
            appointment.id,
            appointment.participant_ids.len()
        );
        Ok(appointment)
    }

    /// Appointments `caller` participates in, earliest first, in the
    /// caller's timezone.
    pub fn list_for(&self, caller: UserId) -> Result<Vec<AppointmentView>, AppointmentServiceError> {
        let viewer = self.caller(caller)?;
        let mut directory = HashMap::new();
        let mut views = Vec::new();

        for appointment in self.appointments.list_for_participant(caller)? {
            match self.project(&appointment, &viewer, &mut directory)? {
                Some(view) => views.push(view),
                None => warn!(
                    "event=appointment_list module=service status=skipped appointment_id={} reason=creator_missing",
                    appointment.id
                ),
            }
        }
        debug!(
            "event=appointment_list module=service status=ok user_id={caller} count={}",
            views.len()
        );
        Ok(views)
    }

    /// One appointment, visible to its creator and participants only.
    pub fn get(
        &self,
        caller: UserId,
        id: AppointmentId,
    ) -> Result<AppointmentView, AppointmentServiceError> {
        let viewer = self.caller(caller)?;
        let appointment = self
            .appointments
            .get_appointment(id)?
            .ok_or(AppointmentServiceError::AppointmentNotFound(id))?;
        if appointment.creator_id != caller && !appointment.has_participant(caller) {
            return Err(AppointmentServiceError::NotParticipant(id));
        }

        let mut directory = HashMap::new();
        self.project(&appointment, &viewer, &mut directory)?
            .ok_or(AppointmentServiceError::CreatorNotFound(appointment.creator_id))
    }

    /// Permanently removes an appointment created by `caller`.
    pub fn delete(&self, caller: UserId, id: AppointmentId) -> Result<(), AppointmentServiceError> {
        let appointment = self
            .appointments
            .get_appointment(id)?
            .ok_or(AppointmentServiceError::AppointmentNotFound(id))?;
        if appointment.creator_id != caller {
            warn!(
                "event=appointment_delete module=service status=rejected appointment_id={id} caller_id={caller}"
            );
            return Err(AppointmentServiceError::NotCreator(id));
        }

        self.appointments.delete_appointment(id)?;
        info!("event=appointment_delete module=service status=ok appointment_id={id}");
        Ok(())
    }

    fn caller(&self, caller: UserId) -> Result<User, AppointmentServiceError> {
        self.users
            .get_user(caller)?
            .ok_or(AppointmentServiceError::UserNotFound(caller))
    }

    /// Distinct invitees in request order, creator excluded.
    fn load_invitees(
        &self,
        creator: &User,
        participant_ids: &[UserId],
    ) -> Result<Vec<User>, AppointmentServiceError> {
        let mut invitees: Vec<User> = Vec::with_capacity(participant_ids.len());
        for id in participant_ids {
            if *id == creator.id || invitees.iter().any(|user| user.id == *id) {
                continue;
            }
            let user = self
                .users
                .get_user(*id)?
                .ok_or(AppointmentServiceError::ParticipantNotFound(*id))?;
            invitees.push(user);
        }
        Ok(invitees)
    }

    fn timezones_to_check(&self, creator: &User, invitees: &[User]) -> Vec<String> {
        let mut timezones = vec![creator.preferred_timezone.clone()];
        if self.scope == TimezoneScope::AllParticipants {
            for user in invitees {
                if !timezones.contains(&user.preferred_timezone) {
                    timezones.push(user.preferred_timezone.clone());
                }
            }
        }
        timezones
    }

    /// Builds the viewer projection. `None` when the creator row is gone.
    fn project(
        &self,
        appointment: &Appointment,
        viewer: &User,
        directory: &mut HashMap<UserId, Option<UserSummary>>,
    ) -> Result<Option<AppointmentView>, AppointmentServiceError> {
        let Some(creator) = self.summary(appointment.creator_id, directory)? else {
            return Ok(None);
        };

        let mut participants = Vec::with_capacity(appointment.participant_ids.len());
        for id in &appointment.participant_ids {
            if let Some(summary) = self.summary(*id, directory)? {
                participants.push(summary);
            }
        }

        Ok(Some(AppointmentView {
            id: appointment.id,
            title: appointment.title.clone(),
            creator_id: appointment.creator_id,
            start: appointment.start,
            end: appointment.end,
            start_local: format_in_timezone(appointment.start, &viewer.preferred_timezone)?,
            end_local: format_in_timezone(appointment.end, &viewer.preferred_timezone)?,
            creator,
            participants,
            created_at: appointment.created_at,
        }))
    }

    fn summary(
        &self,
        id: UserId,
        directory: &mut HashMap<UserId, Option<UserSummary>>,
    ) -> Result<Option<UserSummary>, AppointmentServiceError> {
        if let Some(cached) = directory.get(&id) {
            return Ok(cached.clone());
        }
        let summary = self.users.get_user(id)?.map(|user| user.summary());
        directory.insert(id, summary.clone());
        Ok(summary)
    }
}
