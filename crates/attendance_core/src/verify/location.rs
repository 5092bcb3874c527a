//! Geofence acceptance decision.
//!
//! # Responsibility
//! - Decide whether a position sample is trustworthy and close enough to an
//!   office site to accept a check-in.
//!
//! # Invariants
//! - The radius comparison is inclusive.
//! - Missing, negative or non-finite accuracy fails closed.
//! - `accepted` is exactly `within_radius && accuracy_acceptable`.
//! - Verification is total: it never errors and never panics.

use crate::geo::distance_meters;
use crate::model::geo::{OfficeSite, PositionSample};
use serde::{Deserialize, Serialize};

/// Why a sample was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The fix is too uncertain to trust the radius comparison.
    AccuracyTooLow,
    /// The fix is trustworthy but lies outside the site radius.
    OutsideRadius,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccuracyTooLow => f.write_str("accuracy too low"),
            Self::OutsideRadius => f.write_str("outside radius"),
        }
    }
}

/// Outcome of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub distance_meters: f64,
    pub within_radius: bool,
    pub accuracy_acceptable: bool,
    pub accepted: bool,
}

impl VerificationResult {
    /// Returns the actionable reason for a rejection, or `None` if accepted.
    ///
    /// Accuracy wins over distance: an untrusted fix makes the distance
    /// meaningless.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        if self.accepted {
            None
        } else if !self.accuracy_acceptable {
            Some(RejectionReason::AccuracyTooLow)
        } else {
            Some(RejectionReason::OutsideRadius)
        }
    }
}

/// Geofence verifier parameterized by the accuracy cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationVerifier {
    max_accuracy_meters: f64,
}

impl LocationVerifier {
    pub fn new(max_accuracy_meters: f64) -> Self {
        Self {
            max_accuracy_meters,
        }
    }

    pub fn max_accuracy_meters(&self) -> f64 {
        self.max_accuracy_meters
    }

    pub fn verify(&self, sample: &PositionSample, site: &OfficeSite) -> VerificationResult {
        let distance = distance_meters(sample.coordinate, site.coordinate);
        // NaN compares false, so a broken fix lands outside the radius.
        let within_radius = distance <= site.allowed_radius_meters;
        let accuracy_acceptable = self.accuracy_acceptable(sample.accuracy_meters);

        VerificationResult {
            distance_meters: distance,
            within_radius,
            accuracy_acceptable,
            accepted: within_radius && accuracy_acceptable,
        }
    }

    fn accuracy_acceptable(&self, accuracy_meters: Option<f64>) -> bool {
        match accuracy_meters {
            Some(accuracy) => {
                accuracy.is_finite() && accuracy >= 0.0 && accuracy <= self.max_accuracy_meters
            }
            None => false,
        }
    }
}
