use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use super::{AttendanceFilter, AttendanceStore, LeaveFilter, LeaveStore, StoreError};
use crate::model::attendance::AttendanceDayRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// In-memory store for tests and local development. Enforces the same
/// uniqueness and overlap backstops as the MySQL store so engine behaviour
/// does not depend on which store is plugged in.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    attendance: Vec<AttendanceDayRecord>,
    leaves: Vec<LeaveRequest>,
    next_attendance_id: u64,
    next_leave_id: u64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AttendanceStore for MemStore {
    async fn find_by_key(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceDayRecord>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn insert(&self, record: &AttendanceDayRecord) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        if inner
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(StoreError::Duplicate);
        }
        inner.next_attendance_id += 1;
        let id = inner.next_attendance_id;
        let mut record = record.clone();
        record.id = id;
        inner.attendance.push(record);
        Ok(id)
    }

    async fn update(&self, record: &AttendanceDayRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(slot) = inner.attendance.iter_mut().find(|r| r.id == record.id) {
            *slot = record.clone();
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<AttendanceDayRecord>, i64), StoreError> {
        let inner = self.lock();
        let mut rows: Vec<AttendanceDayRecord> = inner
            .attendance
            .iter()
            .filter(|r| filter.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| filter.date_from.is_none_or(|from| r.date >= from))
            .filter(|r| filter.date_to.is_none_or(|to| r.date <= to))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        let total = rows.len() as i64;
        let offset = (filter.page.saturating_sub(1) * filter.per_page) as usize;
        let page: Vec<AttendanceDayRecord> = rows
            .into_iter()
            .skip(offset)
            .take(filter.per_page as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl LeaveStore for MemStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let inner = self.lock();
        Ok(inner.leaves.iter().find(|r| r.id == id).cloned())
    }

    async fn find_active_leave_spans(
        &self,
        employee_id: u64,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .leaves
            .iter()
            .filter(|r| r.employee_id == employee_id && statuses.contains(&r.status))
            .cloned()
            .collect())
    }

    async fn insert(&self, request: &LeaveRequest) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let conflict = inner.leaves.iter().any(|existing| {
            existing.employee_id == request.employee_id
                && LeaveStatus::ACTIVE.contains(&existing.status)
                && request.start_date <= existing.end_date
                && existing.start_date <= request.end_date
        });
        if conflict {
            return Err(StoreError::Duplicate);
        }
        inner.next_leave_id += 1;
        let id = inner.next_leave_id;
        let mut request = request.clone();
        request.id = id;
        inner.leaves.push(request);
        Ok(id)
    }

    async fn update(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(slot) = inner.leaves.iter_mut().find(|r| r.id == request.id) {
            *slot = request.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.leaves.retain(|r| r.id != id);
        Ok(())
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let inner = self.lock();
        let mut rows: Vec<LeaveRequest> = inner
            .leaves
            .iter()
            .filter(|r| filter.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.leave_type.is_none_or(|t| r.leave_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as i64;
        let offset = (filter.page.saturating_sub(1) * filter.per_page) as usize;
        let page: Vec<LeaveRequest> = rows
            .into_iter()
            .skip(offset)
            .take(filter.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn query_by_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .leaves
            .iter()
            .filter(|r| r.employee_id == employee_id && r.start_date.year() == year)
            .cloned()
            .collect())
    }
}
