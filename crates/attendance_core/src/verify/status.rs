//! Time-of-day status classification for check-ins.
//!
//! # Invariants
//! - `t <= early_threshold` is `Early`, `t <= late_threshold` is `Present`,
//!   anything later is `Late`.
//! - `Absent` is never produced here.

use crate::model::attendance::AttendanceStatus;
use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Configured work-hours window, in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// Nominal start of the working day. Informational; thresholds decide.
    pub start_time: NaiveTime,
    /// Check-ins at or before this time are `Early`.
    pub early_threshold: NaiveTime,
    /// Check-ins after this time are `Late`.
    pub late_threshold: NaiveTime,
}

impl WorkWindow {
    pub fn is_ordered(&self) -> bool {
        self.early_threshold <= self.late_threshold
    }
}

impl Default for WorkWindow {
    fn default() -> Self {
        Self {
            start_time: hm(9, 0),
            early_threshold: hm(8, 45),
            late_threshold: hm(9, 0),
        }
    }
}

/// Classifies a check-in instant expressed in the deployment's local offset.
pub fn classify(check_in: DateTime<FixedOffset>, window: &WorkWindow) -> AttendanceStatus {
    classify_time(check_in.time(), window)
}

/// Classifies a local wall-clock time.
pub fn classify_time(local: NaiveTime, window: &WorkWindow) -> AttendanceStatus {
    // Sub-second noise from device clocks must not tip a boundary check-in.
    let local = local.with_nanosecond(0).unwrap_or(local);
    if local <= window.early_threshold {
        AttendanceStatus::Early
    } else if local <= window.late_threshold {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}
