//! Attendance record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage capabilities the check-in/check-out state machine
//!   relies on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `create_if_absent` is one atomic conditional insert keyed by
//!   `(user_id, work_date)`; it never overwrites an existing record.
//! - `set_check_out_if_absent` is one atomic conditional update; an already
//!   set `check_out_at` is never replaced.
//! - Write paths call `AttendanceRecord::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, RecordId, RecordValidationError,
};
use crate::model::geo::Coordinate;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use thiserror::Error;
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    user_name,
    work_date,
    check_in_at,
    check_out_at,
    status,
    latitude,
    longitude,
    verified
FROM attendance_records";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure. Surfaced to callers of the state machine unchanged.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] RecordValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted attendance data: {0}")]
    InvalidData(String),
    /// Backing store could not be reached.
    #[error("attendance store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable storage of attendance records.
///
/// The two `*_if_absent` writes must be atomic against concurrent callers on
/// any connection or thread; a read followed by a write does not qualify.
pub trait AttendanceRecordStore {
    fn find_by_user_and_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>>;

    /// Inserts `record` unless a record for its `(user_id, date)` exists.
    ///
    /// Returns `true` when this call created the record.
    fn create_if_absent(&self, record: &AttendanceRecord) -> RepoResult<bool>;

    /// Sets `check_out_time` on a checked-in record unless already set.
    ///
    /// Returns `true` when this call set the value.
    fn set_check_out_if_absent(&self, record_id: RecordId, at: DateTime<Utc>)
        -> RepoResult<bool>;

    /// Lists one user's records with `from <= date <= to`, newest day first.
    fn list_by_user(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>>;

    /// Lists every record of one day in check-in order.
    fn list_by_day(&self, day: NaiveDate) -> RepoResult<Vec<AttendanceRecord>>;
}

impl<S: AttendanceRecordStore + ?Sized> AttendanceRecordStore for &S {
    fn find_by_user_and_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        (**self).find_by_user_and_day(user_id, day)
    }

    fn create_if_absent(&self, record: &AttendanceRecord) -> RepoResult<bool> {
        (**self).create_if_absent(record)
    }

    fn set_check_out_if_absent(
        &self,
        record_id: RecordId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        (**self).set_check_out_if_absent(record_id, at)
    }

    fn list_by_user(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        (**self).list_by_user(user_id, from, to)
    }

    fn list_by_day(&self, day: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        (**self).list_by_day(day)
    }
}

/// SQLite-backed attendance store.
///
/// Atomicity comes from the `UNIQUE (user_id, work_date)` constraint and
/// single-statement conditional writes, so it holds across connections and
/// processes sharing one database file.
pub struct SqliteAttendanceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AttendanceRecordStore for SqliteAttendanceStore<'_> {
    fn find_by_user_and_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE user_id = ?1
               AND work_date = ?2;"
        ))?;

        let mut rows = stmt.query(params![user_id, date_to_db(day)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }

        Ok(None)
    }

    fn create_if_absent(&self, record: &AttendanceRecord) -> RepoResult<bool> {
        record.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO attendance_records (
                uuid,
                user_id,
                user_name,
                work_date,
                check_in_at,
                check_out_at,
                status,
                latitude,
                longitude,
                verified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (user_id, work_date) DO NOTHING;",
            params![
                record.id.to_string(),
                record.user_id.as_str(),
                record.user_name.as_str(),
                date_to_db(record.date),
                record.check_in_time.map(|t| t.timestamp_millis()),
                record.check_out_time.map(|t| t.timestamp_millis()),
                record.status.as_str(),
                record.location.latitude,
                record.location.longitude,
                bool_to_int(record.verified),
            ],
        )?;

        Ok(inserted == 1)
    }

    fn set_check_out_if_absent(
        &self,
        record_id: RecordId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let at_ms = at.timestamp_millis();
        let changed = self.conn.execute(
            "UPDATE attendance_records
             SET
                check_out_at = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2
               AND check_in_at IS NOT NULL
               AND check_in_at <= ?1
               AND check_out_at IS NULL;",
            params![at_ms, record_id.to_string()],
        )?;

        Ok(changed == 1)
    }

    fn list_by_user(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE user_id = ?1
               AND work_date BETWEEN ?2 AND ?3
             ORDER BY work_date DESC;"
        ))?;

        let mut rows = stmt.query(params![user_id, date_to_db(from), date_to_db(to)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn list_by_day(&self, day: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE work_date = ?1
             ORDER BY check_in_at ASC, user_id ASC;"
        ))?;

        let mut rows = stmt.query([date_to_db(day)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in attendance_records.uuid"
        ))
    })?;

    let date_text: String = row.get("work_date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in attendance_records.work_date"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = AttendanceStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in attendance_records.status"
        ))
    })?;

    let verified = match row.get::<_, i64>("verified")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid verified value `{other}` in attendance_records.verified"
            )));
        }
    };

    let record = AttendanceRecord {
        id,
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        date,
        check_in_time: parse_instant(row.get("check_in_at")?, "check_in_at")?,
        check_out_time: parse_instant(row.get("check_out_at")?, "check_out_at")?,
        status,
        location: Coordinate::new(row.get("latitude")?, row.get("longitude")?),
        verified,
    };
    record.validate()?;
    Ok(record)
}

fn parse_instant(value: Option<i64>, column: &str) -> RepoResult<Option<DateTime<Utc>>> {
    value
        .map(|ms| {
            DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid epoch millis `{ms}` in attendance_records.{column}"
                ))
            })
        })
        .transpose()
}

fn date_to_db(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
