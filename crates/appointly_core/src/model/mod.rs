//! Scheduling domain model.
//!
//! # Responsibility
//! - Define the user and appointment records shared by repo/service layers.
//! - Own record-level validation that does not need storage access.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Instants are stored and compared in UTC.

pub mod appointment;
pub mod user;
