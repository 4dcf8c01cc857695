pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::{Display, Error};

use crate::model::attendance::{AttendanceDayRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

#[derive(Debug, Display, Error)]
pub enum StoreError {
    /// A storage-level uniqueness or conflict constraint fired: the
    /// `(employee_id, date)` key for attendance, the overlap backstop for
    /// leave inserts. Closes the races application-level checks cannot.
    #[display(fmt = "duplicate key")]
    Duplicate,

    #[display(fmt = "corrupt row: {}", _0)]
    Decode(#[error(not(source))] String),

    #[display(fmt = "database error: {}", _0)]
    Database(#[error(source)] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl Default for AttendanceFilter {
    fn default() -> Self {
        Self {
            employee_id: None,
            date_from: None,
            date_to: None,
            status: None,
            page: 1,
            per_page: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl Default for LeaveFilter {
    fn default() -> Self {
        Self {
            employee_id: None,
            status: None,
            leave_type: None,
            page: 1,
            per_page: 10,
        }
    }
}

/// Persistence contract for attendance day records. Records are keyed by
/// `(employee_id, date)` and never deleted; `update` must write the interval
/// sequences and the derived totals as one unit.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_key(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceDayRecord>, StoreError>;

    /// Inserts a fresh record and returns its id. Fails with
    /// [`StoreError::Duplicate`] when a record for the same employee and day
    /// already exists, whichever call lost the race.
    async fn insert(&self, record: &AttendanceDayRecord) -> Result<u64, StoreError>;

    async fn update(&self, record: &AttendanceDayRecord) -> Result<(), StoreError>;

    /// Page of records (newest day first) plus the unpaged total.
    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<AttendanceDayRecord>, i64), StoreError>;
}

/// Persistence contract for leave requests.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// All requests for the employee in any of the given statuses; the
    /// overlap guard runs against this set.
    async fn find_active_leave_spans(
        &self,
        employee_id: u64,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Inserts a fresh request and returns its id. Fails with
    /// [`StoreError::Duplicate`] when the store-side overlap backstop finds
    /// a pending/approved request for the same employee on the same dates.
    async fn insert(&self, request: &LeaveRequest) -> Result<u64, StoreError>;

    async fn update(&self, request: &LeaveRequest) -> Result<(), StoreError>;

    async fn delete(&self, id: u64) -> Result<(), StoreError>;

    /// Page of requests (newest first) plus the unpaged total.
    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), StoreError>;

    /// Requests whose start date falls inside the given calendar year.
    async fn query_by_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
}
