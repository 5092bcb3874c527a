//! Attendance record domain model.
//!
//! # Responsibility
//! - Define the per-user-per-day attendance record and its status vocabulary.
//! - Validate record-level invariants before persistence and after reads.
//!
//! # Invariants
//! - At most one record exists per `(user_id, date)`; enforced by stores.
//! - `check_out_time` requires `check_in_time` and is never earlier than it.
//! - `status` and `verified` are written once at check-in.

use crate::model::geo::Coordinate;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of one attendance record.
pub type RecordId = Uuid;

/// Status label assigned once at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Early,
    /// Only assigned by external end-of-day reconciliation.
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Late => "late",
            Self::Early => "early",
            Self::Absent => "absent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "present" => Some(Self::Present),
            "late" => Some(Self::Late),
            "early" => Some(Self::Early),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// Lifecycle position of one user for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    NoRecord,
    CheckedIn,
    CheckedOut,
}

/// Record-level invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordValidationError {
    #[error("user_id must not be empty")]
    EmptyUserId,
    #[error("check_out_time requires check_in_time")]
    CheckOutWithoutCheckIn,
    #[error("check_out_time {check_out} is earlier than check_in_time {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },
}

/// One attendance record per `(user_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub user_id: String,
    pub user_name: String,
    /// Calendar day in the deployment's configured offset.
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    /// Position captured at check-in.
    pub location: Coordinate,
    /// Whether the check-in passed location verification.
    pub verified: bool,
}

impl AttendanceRecord {
    /// Builds the record a successful check-in creates.
    pub fn checked_in(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        date: NaiveDate,
        check_in_time: DateTime<Utc>,
        status: AttendanceStatus,
        location: Coordinate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            date,
            check_in_time: Some(check_in_time),
            check_out_time: None,
            status,
            location,
            verified: true,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(RecordValidationError::EmptyUserId);
        }
        match (self.check_in_time, self.check_out_time) {
            (None, Some(_)) => Err(RecordValidationError::CheckOutWithoutCheckIn),
            (Some(check_in), Some(check_out)) if check_out < check_in => {
                Err(RecordValidationError::CheckOutBeforeCheckIn {
                    check_in,
                    check_out,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn day_state(&self) -> DayState {
        match (self.check_in_time, self.check_out_time) {
            (_, Some(_)) => DayState::CheckedOut,
            (Some(_), None) => DayState::CheckedIn,
            (None, None) => DayState::NoRecord,
        }
    }

    /// Time between check-in and check-out, once both are recorded.
    pub fn worked_duration(&self) -> Option<Duration> {
        Some(self.check_out_time? - self.check_in_time?)
    }
}
