use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// One open or closed span of time inside an attendance day (a break or a
/// namaz period). An absent `end` means the span is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Interval {
    #[schema(example = "2026-01-01T12:00:00Z", format = "date-time", value_type = String)]
    pub start: DateTime<Utc>,
    #[schema(example = "2026-01-01T12:15:00Z", format = "date-time", value_type = String, nullable = true)]
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Free-form record of work done during the day, attached at check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskEntry {
    #[schema(example = "Quarterly report")]
    pub name: String,
    #[schema(example = "Finalized the Q2 numbers", nullable = true)]
    pub description: Option<String>,
    #[schema(example = 2.5, nullable = true)]
    pub hours_spent: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Shift {
    Morning,
    Evening,
    Night,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
}

/// A single employee's attendance for a single calendar day.
///
/// Exactly one record may exist per `(employee_id, date)`; the record is
/// created at check-in and closed at check-out. Break and namaz spans are
/// tracked as ordered interval sequences, and the derived totals are stored
/// alongside them so in-progress days still report accumulated minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceDayRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "morning")]
    pub shift: Shift,
    #[schema(example = "2026-01-01T09:10:00Z", format = "date-time", value_type = String)]
    pub check_in: DateTime<Utc>,
    #[schema(example = "2026-01-01T17:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub check_out: Option<DateTime<Utc>>,
    #[schema(example = "traffic on the ring road", nullable = true)]
    pub check_in_reason: Option<String>,
    #[schema(nullable = true)]
    pub check_out_reason: Option<String>,
    #[schema(example = "late")]
    pub status: AttendanceStatus,
    pub breaks: Vec<Interval>,
    pub namaz: Vec<Interval>,
    #[schema(example = 15.0)]
    pub total_break_minutes: f64,
    #[schema(example = 10.0)]
    pub total_namaz_minutes: f64,
    #[schema(example = 7.83, nullable = true)]
    pub total_hours: Option<f64>,
    pub tasks_completed: Vec<TaskEntry>,
}

impl AttendanceDayRecord {
    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }
}
