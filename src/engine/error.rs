use chrono::NaiveDate;
use derive_more::{Display, Error};

use crate::engine::interval::IntervalKind;
use crate::model::leave_request::LeaveStatus;
use crate::store::StoreError;

/// Everything a mutating operation can refuse with. Each variant is a
/// terminal validation failure carrying enough context for a user-facing
/// message; `Store` is the only infrastructure failure.
#[derive(Debug, Display, Error)]
pub enum EngineError {
    #[display(fmt = "Attendance already recorded for today")]
    AlreadyCheckedIn,

    #[display(fmt = "No attendance record found for today")]
    NoActiveCheckIn,

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "Attendance record is already closed for the day")]
    RecordAlreadyClosed,

    #[display(fmt = "A {} period is already running", kind)]
    IntervalAlreadyOpen { kind: IntervalKind },

    #[display(fmt = "No open {} period to close", kind)]
    NoOpenInterval { kind: IntervalKind },

    #[display(fmt = "Start date cannot be after end date")]
    InvalidRange,

    #[display(fmt = "Overlaps an existing pending or approved leave ({} to {})", start, end)]
    OverlappingLeave { start: NaiveDate, end: NaiveDate },

    #[display(fmt = "Leave request not found")]
    NotFound,

    #[display(fmt = "Only pending leave requests can be edited")]
    NotEditable,

    #[display(fmt = "Only pending leave requests can be deleted")]
    NotDeletable,

    #[display(fmt = "You do not have permission to {} this leave request", action)]
    Forbidden { action: &'static str },

    #[display(fmt = "Cannot {} a leave request that is {}", action, status)]
    InvalidTransition {
        action: &'static str,
        status: LeaveStatus,
    },

    #[display(fmt = "Storage error: {}", _0)]
    Store(#[error(source)] StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}
