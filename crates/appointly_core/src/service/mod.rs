//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate parsing, validation and repository calls into use-case APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod appointment_service;
pub mod user_service;
