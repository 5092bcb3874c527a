//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate verification and store calls into attendance use-cases.
//! - Keep callers decoupled from storage details.

pub mod attendance_service;
