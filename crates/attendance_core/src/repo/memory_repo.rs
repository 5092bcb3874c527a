//! Process-local attendance store.
//!
//! # Invariants
//! - Every operation runs under one mutex, so the conditional writes are
//!   atomic across threads sharing the store.

use crate::model::attendance::{AttendanceRecord, RecordId};
use crate::repo::attendance_repo::{AttendanceRecordStore, RepoResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<RecordId, AttendanceRecord>,
    by_user_day: HashMap<(String, NaiveDate), RecordId>,
}

/// Mutex-guarded in-memory store, safe to share across threads by reference.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    tables: Mutex<Tables>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Writes below never leave the maps half-updated before a panic point.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AttendanceRecordStore for InMemoryAttendanceStore {
    fn find_by_user_and_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        let tables = self.lock();
        Ok(tables
            .by_user_day
            .get(&(user_id.to_string(), day))
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    fn create_if_absent(&self, record: &AttendanceRecord) -> RepoResult<bool> {
        record.validate()?;

        let mut tables = self.lock();
        let key = (record.user_id.clone(), record.date);
        if tables.by_user_day.contains_key(&key) || tables.records.contains_key(&record.id) {
            return Ok(false);
        }
        tables.by_user_day.insert(key, record.id);
        tables.records.insert(record.id, record.clone());
        Ok(true)
    }

    fn set_check_out_if_absent(
        &self,
        record_id: RecordId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut tables = self.lock();
        let Some(record) = tables.records.get_mut(&record_id) else {
            return Ok(false);
        };
        match (record.check_in_time, record.check_out_time) {
            (Some(check_in), None) if check_in <= at => {
                record.check_out_time = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn list_by_user(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let tables = self.lock();
        let mut records: Vec<AttendanceRecord> = tables
            .records
            .values()
            .filter(|record| record.user_id == user_id && record.date >= from && record.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    fn list_by_day(&self, day: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        let tables = self.lock();
        let mut records: Vec<AttendanceRecord> = tables
            .records
            .values()
            .filter(|record| record.date == day)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.check_in_time
                .cmp(&b.check_in_time)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(records)
    }
}
