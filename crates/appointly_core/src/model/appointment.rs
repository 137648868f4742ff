//! Appointment domain model.
//!
//! # Responsibility
//! - Define the persisted appointment record and its listing projection.
//! - Normalize participant lists so the creator is always included once.
//!
//! # Invariants
//! - `title` is non-empty after trimming.
//! - `end` is strictly after `start`.
//! - `participant_ids` starts with `creator_id` and holds no duplicates.

use crate::model::user::{UserId, UserSummary};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AppointmentId = Uuid;

/// Record-level validation failure for `Appointment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentValidationError {
    EmptyTitle,
    EndNotAfterStart,
    CreatorNotParticipant,
    DuplicateParticipant(UserId),
}

impl Display for AppointmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "appointment title cannot be empty"),
            Self::EndNotAfterStart => write!(f, "end time must be after start time"),
            Self::CreatorNotParticipant => {
                write!(f, "appointment creator must be the first participant")
            }
            Self::DuplicateParticipant(id) => write!(f, "duplicate participant: {id}"),
        }
    }
}

impl Error for AppointmentValidationError {}

/// Persisted appointment with UTC instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub title: String,
    pub creator_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Creator first, then invitees in request order.
    pub participant_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Creates an appointment with a generated id.
    ///
    /// `invitees` may contain the creator or duplicates; both are dropped.
    pub fn new(
        title: impl Into<String>,
        creator_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        invitees: &[UserId],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            creator_id,
            start,
            end,
            participant_ids: normalize_participants(creator_id, invitees),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn validate(&self) -> Result<(), AppointmentValidationError> {
        if self.title.trim().is_empty() {
            return Err(AppointmentValidationError::EmptyTitle);
        }
        if self.end <= self.start {
            return Err(AppointmentValidationError::EndNotAfterStart);
        }
        if self.participant_ids.first() != Some(&self.creator_id) {
            return Err(AppointmentValidationError::CreatorNotParticipant);
        }
        let mut seen = HashSet::with_capacity(self.participant_ids.len());
        for id in &self.participant_ids {
            if !seen.insert(*id) {
                return Err(AppointmentValidationError::DuplicateParticipant(*id));
            }
        }
        Ok(())
    }

    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participant_ids.contains(&user_id)
    }
}

/// Returns `creator` followed by the distinct non-creator `invitees`.
pub fn normalize_participants(creator: UserId, invitees: &[UserId]) -> Vec<UserId> {
    let mut seen = HashSet::with_capacity(invitees.len() + 1);
    seen.insert(creator);
    let mut ids = vec![creator];
    ids.extend(invitees.iter().copied().filter(|id| seen.insert(*id)));
    ids
}

/// Appointment projected into a viewer's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: AppointmentId,
    pub title: String,
    pub creator_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `YYYY-MM-DD HH:MM:SS` in the viewer's timezone.
    pub start_local: String,
    pub end_local: String,
    pub creator: UserSummary,
    pub participants: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}
