//! Core scheduling logic for Appointly.
//! This crate is the single source of truth for scheduling invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::appointment::{Appointment, AppointmentId, AppointmentView};
pub use model::user::{User, UserId, UserSummary};
pub use repo::appointment_repo::{AppointmentRepository, SqliteAppointmentRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use schedule::{
    ScheduleError, ScheduleResult, TimezoneVerdict, WorkingHoursValidator, WorkingWindow,
};
pub use service::appointment_service::{
    AppointmentService, AppointmentServiceError, CreateAppointmentRequest, TimezoneScope,
};
pub use service::user_service::{
    CreateUserRequest, UpdateUserRequest, UserService, UserServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
