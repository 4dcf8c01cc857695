use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::clock::Clock;
use super::error::EngineError;
use super::overlap;
use super::policy::{self, Caller, LeaveAction};
use super::stats::{self, LeaveTypeStats};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::store::{LeaveFilter, LeaveStore, StoreError};

/// Fields the owner may change while the request is still pending. Absent
/// fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct LeavePatch {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub attachments: Option<Vec<String>>,
}

/// Applies one review action to a loaded request. The permission matrix is
/// consulted before any state rule, so a caller who may never perform the
/// action sees `Forbidden` rather than a state error. Every successful
/// transition stamps `reviewed_by`/`reviewed_at` with the caller's account
/// id, overwriting any earlier review when a reviewer cancels an
/// already-decided request.
pub fn apply_transition(
    request: &LeaveRequest,
    action: LeaveAction,
    caller: Caller,
    now: DateTime<Utc>,
) -> Result<LeaveRequest, EngineError> {
    let is_owner = caller.owns(request.employee_id);
    if !policy::permits(caller.role, is_owner, action) {
        return Err(EngineError::Forbidden {
            action: action.verb(),
        });
    }
    let new_status = match (action, request.status) {
        (LeaveAction::Approve, LeaveStatus::Pending) => LeaveStatus::Approved,
        (LeaveAction::Reject, LeaveStatus::Pending) => LeaveStatus::Rejected,
        (LeaveAction::Cancel, LeaveStatus::Pending) => LeaveStatus::Cancelled,
        (LeaveAction::Cancel, LeaveStatus::Approved | LeaveStatus::Rejected)
            if policy::is_reviewer(caller.role) =>
        {
            LeaveStatus::Cancelled
        }
        _ => {
            return Err(EngineError::InvalidTransition {
                action: action.verb(),
                status: request.status,
            });
        }
    };
    let mut next = request.clone();
    next.status = new_status;
    next.reviewed_by = Some(caller.user_id);
    next.reviewed_at = Some(now);
    Ok(next)
}

/// Owner-only edit of a pending request: applies the patch and re-checks
/// the date range. Overlap re-validation needs the employee's other active
/// spans and stays with the engine.
pub fn apply_edit(request: &LeaveRequest, patch: LeavePatch) -> Result<LeaveRequest, EngineError> {
    if request.status != LeaveStatus::Pending {
        return Err(EngineError::NotEditable);
    }
    let mut next = request.clone();
    if let Some(leave_type) = patch.leave_type {
        next.leave_type = leave_type;
    }
    if let Some(start) = patch.start_date {
        next.start_date = start;
    }
    if let Some(end) = patch.end_date {
        next.end_date = end;
    }
    if let Some(reason) = patch.reason {
        next.reason = reason;
    }
    if let Some(attachments) = patch.attachments {
        next.attachments = attachments;
    }
    if next.start_date > next.end_date {
        return Err(EngineError::InvalidRange);
    }
    Ok(next)
}

/// Leave request lifecycle over an abstract store and clock.
pub struct LeaveEngine<S, C> {
    store: S,
    clock: C,
}

impl<S: LeaveStore, C: Clock> LeaveEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Inserts a fresh pending request after the range and overlap checks.
    /// The store-side overlap backstop closes the race between two
    /// concurrent creates; a duplicate from that path surfaces as the same
    /// `OverlappingLeave` the application-level check would have raised.
    pub async fn create(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
        attachments: Vec<String>,
    ) -> Result<LeaveRequest, EngineError> {
        if start_date > end_date {
            return Err(EngineError::InvalidRange);
        }
        let active = self
            .store
            .find_active_leave_spans(employee_id, &LeaveStatus::ACTIVE)
            .await?;
        if let Some(conflict) = overlap::first_conflict(start_date, end_date, &active, None) {
            return Err(EngineError::OverlappingLeave {
                start: conflict.start_date,
                end: conflict.end_date,
            });
        }
        let mut request = LeaveRequest {
            id: 0,
            employee_id,
            leave_type,
            start_date,
            end_date,
            reason,
            status: LeaveStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            attachments,
            created_at: self.clock.now(),
        };
        let id = self.store.insert(&request).await.map_err(|err| match err {
            StoreError::Duplicate => EngineError::OverlappingLeave {
                start: start_date,
                end: end_date,
            },
            other => EngineError::Store(other),
        })?;
        request.id = id;
        Ok(request)
    }

    /// A request is only visible to its owner; everyone else sees
    /// `NotFound` rather than `NotEditable`.
    pub async fn edit(
        &self,
        request_id: u64,
        caller: Caller,
        patch: LeavePatch,
    ) -> Result<LeaveRequest, EngineError> {
        let record = self
            .store
            .find_by_id(request_id)
            .await?
            .filter(|r| caller.owns(r.employee_id))
            .ok_or(EngineError::NotFound)?;
        let next = apply_edit(&record, patch)?;
        let active = self
            .store
            .find_active_leave_spans(record.employee_id, &LeaveStatus::ACTIVE)
            .await?;
        if let Some(conflict) =
            overlap::first_conflict(next.start_date, next.end_date, &active, Some(request_id))
        {
            return Err(EngineError::OverlappingLeave {
                start: conflict.start_date,
                end: conflict.end_date,
            });
        }
        self.store.update(&next).await?;
        Ok(next)
    }

    pub async fn transition(
        &self,
        request_id: u64,
        caller: Caller,
        action: LeaveAction,
    ) -> Result<LeaveRequest, EngineError> {
        let record = self
            .store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        let next = apply_transition(&record, action, caller, self.clock.now())?;
        self.store.update(&next).await?;
        Ok(next)
    }

    /// Owners may delete their own pending requests; reviewer roles may
    /// delete any request in any state. Returns the removed request.
    pub async fn delete(&self, request_id: u64, caller: Caller) -> Result<LeaveRequest, EngineError> {
        let record = self
            .store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        let is_owner = caller.owns(record.employee_id);
        if !policy::permits(caller.role, is_owner, LeaveAction::Delete) {
            return Err(EngineError::Forbidden { action: "delete" });
        }
        if !policy::is_reviewer(caller.role) && record.status != LeaveStatus::Pending {
            return Err(EngineError::NotDeletable);
        }
        self.store.delete(request_id).await?;
        Ok(record)
    }

    pub async fn get(&self, request_id: u64, caller: Caller) -> Result<LeaveRequest, EngineError> {
        let record = self
            .store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if !caller.owns(record.employee_id) && !policy::is_reviewer(caller.role) {
            return Err(EngineError::NotFound);
        }
        Ok(record)
    }

    pub async fn list(
        &self,
        filter: &LeaveFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), EngineError> {
        Ok(self.store.list(filter).await?)
    }

    pub async fn year_stats(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<HashMap<LeaveType, LeaveTypeStats>, EngineError> {
        let requests = self.store.query_by_year(employee_id, year).await?;
        Ok(stats::compute_year_stats(&requests))
    }

    /// Year of the engine clock's today, used to default stats queries.
    pub fn current_year(&self) -> i32 {
        self.clock.today().year()
    }
}
