use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Bereavement,
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Statuses that block other requests from occupying the same dates.
    pub const ACTIVE: [LeaveStatus; 2] = [LeaveStatus::Pending, LeaveStatus::Approved];
}

/// One leave application over an inclusive `[start_date, end_date]` span.
///
/// Created as `pending`; a reviewer moves it to `approved` or `rejected`,
/// and either the owner (while pending) or a reviewer cancels it.
/// `reviewed_by` and `reviewed_at` are set together on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "vacation")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family trip")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    #[schema(example = 7, nullable = true)]
    pub reviewed_by: Option<u64>,
    #[schema(example = "2026-05-20T10:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(example = json!(["medical_note.pdf"]))]
    pub attachments: Vec<String>,
    #[schema(example = "2026-05-18T08:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Whole days covered by plain end-minus-start subtraction; a single-day
    /// request spans 0 here, the aggregator's per-request +1 restores it.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}
