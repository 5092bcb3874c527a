//! Check-in/check-out state machine.
//!
//! # Responsibility
//! - Drive the per-user-per-day lifecycle `NoRecord -> CheckedIn -> CheckedOut`.
//! - Combine geofence verification and status classification into one
//!   check-in decision.
//! - Expose a closed, typed failure vocabulary to callers.
//!
//! # Invariants
//! - Check-in fails closed: a rejected or missing sample never creates a record.
//! - Check-out never blocks on location; a bad sample only yields a warning.
//! - Duplicate-safety comes from the store's conditional writes, not from the
//!   fast-path read that precedes them.
//! - Failure branches never mutate stored state, and nothing retries.

use crate::clock::Clock;
use crate::config::{AttendanceConfig, ConfigError};
use crate::model::attendance::{AttendanceRecord, DayState};
use crate::model::geo::{LocationUnavailable, PositionSample};
use crate::repo::attendance_repo::{AttendanceRecordStore, RepoError, RepoResult};
use crate::verify::location::{LocationVerifier, RejectionReason, VerificationResult};
use crate::verify::status::classify;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use log::{info, warn};
use thiserror::Error;

/// Why a check-in did not create a record.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("already checked in today")]
    AlreadyCheckedIn,
    #[error(
        "location rejected at `{site}` ({reason}): distance {distance_meters:.1} m, accuracy {accuracy_meters:?} m"
    )]
    LocationRejected {
        site: String,
        reason: RejectionReason,
        distance_meters: f64,
        accuracy_meters: Option<f64>,
    },
    #[error("location unavailable: {0}")]
    LocationUnavailable(LocationUnavailable),
    /// Store failure, passed through untranslated.
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Why a check-out did not update the record.
#[derive(Debug, Error)]
pub enum CheckOutError {
    #[error("no check-in recorded today")]
    NoCheckInYet,
    #[error("already checked out today")]
    AlreadyCheckedOut,
    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Non-blocking location finding attached to a successful check-out.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationWarning {
    Rejected {
        site: String,
        reason: RejectionReason,
        distance_meters: f64,
        accuracy_meters: Option<f64>,
    },
    Unavailable(LocationUnavailable),
}

/// Result of a successful check-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutReceipt {
    pub record: AttendanceRecord,
    pub location_warning: Option<LocationWarning>,
}

/// Attendance state machine over a record store and a clock.
pub struct AttendanceService<S: AttendanceRecordStore, C: Clock> {
    store: S,
    clock: C,
    config: AttendanceConfig,
    verifier: LocationVerifier,
}

impl<S: AttendanceRecordStore, C: Clock> AttendanceService<S, C> {
    /// Creates a service after validating `config`.
    pub fn new(store: S, clock: C, config: AttendanceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let verifier = LocationVerifier::new(config.max_accuracy_meters);
        Ok(Self {
            store,
            clock,
            config,
            verifier,
        })
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Checks a user in for today.
    ///
    /// # Contract
    /// - `Err(LocationUnavailable)` samples are reported without touching the store.
    /// - An existing record for today yields `AlreadyCheckedIn`, including when a
    ///   concurrent request wins the conditional insert.
    /// - On success the returned record is exactly what was persisted.
    pub fn request_check_in(
        &self,
        user_id: &str,
        user_name: &str,
        sample: Result<PositionSample, LocationUnavailable>,
    ) -> Result<AttendanceRecord, CheckInError> {
        let sample = match sample {
            Ok(sample) => sample,
            Err(reason) => {
                warn!(
                    "event=check_in module=attendance status=rejected user_id={user_id} reason=location_unavailable detail={reason:?}"
                );
                return Err(CheckInError::LocationUnavailable(reason));
            }
        };

        let now = self.now();
        let day = self.config.local_day(now);

        if self.store.find_by_user_and_day(user_id, day)?.is_some() {
            info!(
                "event=check_in module=attendance status=rejected user_id={user_id} day={day} reason=already_checked_in"
            );
            return Err(CheckInError::AlreadyCheckedIn);
        }

        let (site, verification) = self.verify(&sample);
        if let Some(reason) = verification.rejection_reason() {
            info!(
                "event=check_in module=attendance status=rejected user_id={user_id} day={day} site={site} reason={reason:?} distance_m={:.0}",
                verification.distance_meters
            );
            return Err(CheckInError::LocationRejected {
                site,
                reason,
                distance_meters: verification.distance_meters,
                accuracy_meters: sample.accuracy_meters,
            });
        }

        let status = classify(self.config.local_time(now), &self.config.work_window);
        let record = AttendanceRecord::checked_in(
            user_id,
            user_name,
            day,
            now,
            status,
            sample.coordinate,
        );

        if !self.store.create_if_absent(&record)? {
            info!(
                "event=check_in module=attendance status=rejected user_id={user_id} day={day} reason=already_checked_in race=lost"
            );
            return Err(CheckInError::AlreadyCheckedIn);
        }

        info!(
            "event=check_in module=attendance status=ok user_id={user_id} day={day} site={site} attendance_status={} distance_m={:.0}",
            status.as_str(),
            verification.distance_meters
        );
        Ok(record)
    }

    /// Checks a user out for today.
    ///
    /// Location is advisory: any sample outcome, including an unavailable one,
    /// lets the transition proceed and is reported on the receipt.
    pub fn request_check_out(
        &self,
        user_id: &str,
        sample: Result<PositionSample, LocationUnavailable>,
    ) -> Result<CheckOutReceipt, CheckOutError> {
        let now = self.now();
        let day = self.config.local_day(now);

        let Some(mut record) = self.store.find_by_user_and_day(user_id, day)? else {
            info!(
                "event=check_out module=attendance status=rejected user_id={user_id} day={day} reason=no_check_in"
            );
            return Err(CheckOutError::NoCheckInYet);
        };
        let Some(check_in) = record.check_in_time else {
            info!(
                "event=check_out module=attendance status=rejected user_id={user_id} day={day} reason=no_check_in"
            );
            return Err(CheckOutError::NoCheckInYet);
        };
        if record.check_out_time.is_some() {
            info!(
                "event=check_out module=attendance status=rejected user_id={user_id} day={day} reason=already_checked_out"
            );
            return Err(CheckOutError::AlreadyCheckedOut);
        }

        let location_warning = self.advisory_check(&sample);

        // A client clock behind the stored check-in must not produce an
        // inverted interval.
        let at = now.max(check_in);
        if at != now {
            warn!(
                "event=check_out module=attendance status=clamped user_id={user_id} day={day} skew_ms={}",
                (check_in - now).num_milliseconds()
            );
        }

        if !self.store.set_check_out_if_absent(record.id, at)? {
            // Lost to a concurrent check-out, or the record left the store
            // between the read and the update.
            let still_present = self
                .store
                .find_by_user_and_day(user_id, day)?
                .is_some_and(|current| current.id == record.id);
            let (reason, err) = if still_present {
                ("already_checked_out", CheckOutError::AlreadyCheckedOut)
            } else {
                ("no_check_in", CheckOutError::NoCheckInYet)
            };
            info!(
                "event=check_out module=attendance status=rejected user_id={user_id} day={day} reason={reason} race=lost"
            );
            return Err(err);
        }
        record.check_out_time = Some(at);

        if let Some(warning) = &location_warning {
            warn!(
                "event=check_out module=attendance status=ok_with_warning user_id={user_id} day={day} warning={}",
                warning_code(warning)
            );
        } else {
            info!("event=check_out module=attendance status=ok user_id={user_id} day={day}");
        }

        Ok(CheckOutReceipt {
            record,
            location_warning,
        })
    }

    /// Current lifecycle state of `user_id` for today.
    pub fn day_state(&self, user_id: &str) -> RepoResult<DayState> {
        Ok(self
            .today_record(user_id)?
            .map_or(DayState::NoRecord, |record| record.day_state()))
    }

    pub fn today_record(&self, user_id: &str) -> RepoResult<Option<AttendanceRecord>> {
        let day = self.config.local_day(self.now());
        self.store.find_by_user_and_day(user_id, day)
    }

    /// Records of one user between two days inclusive, newest first.
    pub fn history(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        self.store.list_by_user(user_id, from, to)
    }

    /// Every record of one day in check-in order.
    pub fn daily_roster(&self, day: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        self.store.list_by_day(day)
    }

    /// Resolves the active site for `sample` and verifies against it.
    ///
    /// With no site to compare against, the result is an outside-radius
    /// rejection.
    fn verify(&self, sample: &PositionSample) -> (String, VerificationResult) {
        match self.config.resolve_site(sample.coordinate) {
            Some(site) => (site.name.clone(), self.verifier.verify(sample, site)),
            None => (
                String::new(),
                VerificationResult {
                    distance_meters: f64::INFINITY,
                    within_radius: false,
                    accuracy_acceptable: false,
                    accepted: false,
                },
            ),
        }
    }

    fn advisory_check(
        &self,
        sample: &Result<PositionSample, LocationUnavailable>,
    ) -> Option<LocationWarning> {
        let sample = match sample {
            Ok(sample) => sample,
            Err(reason) => return Some(LocationWarning::Unavailable(*reason)),
        };
        let (site, verification) = self.verify(sample);
        verification
            .rejection_reason()
            .map(|reason| LocationWarning::Rejected {
                site,
                reason,
                distance_meters: verification.distance_meters,
                accuracy_meters: sample.accuracy_meters,
            })
    }

    /// Millisecond precision matches what the SQLite store can hold.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }
}

fn warning_code(warning: &LocationWarning) -> &'static str {
    match warning {
        LocationWarning::Rejected {
            reason: RejectionReason::AccuracyTooLow,
            ..
        } => "accuracy_too_low",
        LocationWarning::Rejected {
            reason: RejectionReason::OutsideRadius,
            ..
        } => "outside_radius",
        LocationWarning::Unavailable(_) => "location_unavailable",
    }
}
