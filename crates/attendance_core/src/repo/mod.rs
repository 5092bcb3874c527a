//! Attendance record store contract and implementations.
//!
//! # Responsibility
//! - Define the storage capabilities required by the state machine.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Conditional writes are atomic at the storage boundary.
//! - Store APIs return semantic data errors (`InvalidData`) in addition to
//!   DB transport errors.

pub mod attendance_repo;
pub mod memory_repo;
