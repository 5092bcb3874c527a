//! Geofenced attendance core.
//! This crate is the single source of truth for check-in/check-out invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod verify;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AttendanceConfig, ConfigError};
pub use geo::distance_meters;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attendance::{
    AttendanceRecord, AttendanceStatus, DayState, RecordId, RecordValidationError,
};
pub use model::geo::{Coordinate, LocationUnavailable, OfficeSite, PositionSample};
pub use repo::attendance_repo::{
    AttendanceRecordStore, RepoError, RepoResult, SqliteAttendanceStore,
};
pub use repo::memory_repo::InMemoryAttendanceStore;
pub use service::attendance_service::{
    AttendanceService, CheckInError, CheckOutError, CheckOutReceipt, LocationWarning,
};
pub use verify::location::{LocationVerifier, RejectionReason, VerificationResult};
pub use verify::status::{classify, classify_time, WorkWindow};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
