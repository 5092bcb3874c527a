//! Position and site value types.
//!
//! # Responsibility
//! - Define coordinates, device position samples and office sites.
//!
//! # Invariants
//! - A missing device accuracy is `None`, never `0.0`.
//! - `OfficeSite::allowed_radius_meters` is finite and `> 0` once the owning
//!   configuration has been validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns whether both components are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One resolved device fix, produced per verification attempt.
///
/// Never persisted on its own; only `coordinate` survives on the created
/// attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coordinate: Coordinate,
    /// Device-reported uncertainty radius. `None` when the device gave none.
    pub accuracy_meters: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(
        coordinate: Coordinate,
        accuracy_meters: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            coordinate,
            accuracy_meters,
            captured_at,
        }
    }
}

/// Reference point that check-ins are fenced against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeSite {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub coordinate: Coordinate,
    pub allowed_radius_meters: f64,
}

/// Reason the caller could not obtain a position sample at all.
///
/// Classified by the caller before the core is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationUnavailable {
    NoSignal,
    PermissionDenied,
    Timeout,
}

impl std::fmt::Display for LocationUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoSignal => "no signal",
            Self::PermissionDenied => "permission denied",
            Self::Timeout => "timed out",
        };
        f.write_str(text)
    }
}
