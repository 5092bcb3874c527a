//! Pure decision functions used by the attendance state machine.
//!
//! # Responsibility
//! - Geofence acceptance (`location`).
//! - Check-in status labelling (`status`).
//!
//! # Invariants
//! - Nothing in this module performs I/O or fails.

pub mod location;
pub mod status;
