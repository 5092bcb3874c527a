//! Attendance domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by verification and the
//!   check-in/check-out state machine.
//!
//! # Invariants
//! - Every attendance record is identified by a stable `RecordId`.
//! - Optional instants and accuracy figures are `Option`, never sentinels.

pub mod attendance;
pub mod geo;
