//! Engine flows over the in-memory store, driven day by day through the
//! manual clock.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use super::attendance::{check_in_record, AttendanceEngine, ShiftRules};
use super::clock::test_clock::ManualClock;
use super::clock::Clock;
use super::error::EngineError;
use super::leave::{LeaveEngine, LeavePatch};
use super::policy::{Caller, LeaveAction};
use crate::model::attendance::{AttendanceDayRecord, AttendanceStatus, Shift};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::store::memory::MemStore;
use crate::store::{AttendanceFilter, AttendanceStore, LeaveFilter, LeaveStore, StoreError};

fn rules() -> ShiftRules {
    ShiftRules {
        morning_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        evening_start: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        night_start: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        half_day_hours: 4.0,
    }
}

fn clock_at(hour: u32, min: u32) -> ManualClock {
    ManualClock::at(Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap())
}

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, d).unwrap()
}

fn leave_engine() -> (LeaveEngine<MemStore, ManualClock>, ManualClock) {
    let clock = ManualClock::at(Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap());
    (LeaveEngine::new(MemStore::new(), clock.clone()), clock)
}

// Account ids sit 30 above the employee ids so ownership checks cannot
// pass by accident through the wrong id space.
fn employee(employee_id: u64) -> Caller {
    Caller {
        user_id: employee_id + 30,
        employee_id: Some(employee_id),
        role: Role::Employee,
    }
}

fn hr() -> Caller {
    Caller {
        user_id: 42,
        employee_id: None,
        role: Role::Hr,
    }
}

async fn vacation<S: LeaveStore>(
    engine: &LeaveEngine<S, ManualClock>,
    employee: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LeaveRequest, EngineError> {
    engine
        .create(employee, LeaveType::Vacation, start, end, "trip".into(), Vec::new())
        .await
}

#[actix_web::test]
async fn full_morning_day_lifecycle() {
    let clock = clock_at(9, 10);
    let engine = AttendanceEngine::new(MemStore::new(), clock.clone(), rules());

    let record = engine
        .check_in(7, Shift::Morning, Some("traffic".into()))
        .await
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Late);
    assert_eq!(record.id, 1);

    clock.set(Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap());
    engine.toggle_break(7).await.unwrap();
    clock.advance(Duration::minutes(15));
    let after_break = engine.toggle_break(7).await.unwrap();
    assert!((after_break.total_break_minutes - 15.0).abs() < 1e-9);
    assert_eq!(after_break.breaks.len(), 1);

    clock.set(Utc.with_ymd_and_hms(2025, 3, 10, 12, 10, 0).unwrap());
    let closed = engine.check_out(7, None, Vec::new()).await.unwrap();
    assert!((closed.total_hours.unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(closed.status, AttendanceStatus::HalfDay);

    let stored = engine.today(7).await.unwrap().unwrap();
    assert_eq!(stored, closed);

    let again = engine.check_out(7, None, Vec::new()).await;
    assert!(matches!(again, Err(EngineError::AlreadyCheckedOut)));
}

#[actix_web::test]
async fn one_record_per_employee_per_day() {
    let clock = clock_at(9, 0);
    let engine = AttendanceEngine::new(MemStore::new(), clock.clone(), rules());

    engine.check_in(7, Shift::Morning, None).await.unwrap();
    let second = engine.check_in(7, Shift::Evening, None).await;
    assert!(matches!(second, Err(EngineError::AlreadyCheckedIn)));

    clock.advance(Duration::days(1));
    engine.check_in(7, Shift::Morning, None).await.unwrap();

    let filter = AttendanceFilter {
        employee_id: Some(7),
        ..AttendanceFilter::default()
    };
    let (rows, total) = engine.list(&filter).await.unwrap();
    assert_eq!(total, 2);
    assert!(rows[0].date > rows[1].date);
}

#[actix_web::test]
async fn operations_require_todays_record() {
    let engine = AttendanceEngine::new(MemStore::new(), clock_at(10, 0), rules());
    assert!(matches!(
        engine.check_out(7, None, Vec::new()).await,
        Err(EngineError::NoActiveCheckIn)
    ));
    assert!(matches!(engine.toggle_break(7).await, Err(EngineError::NoActiveCheckIn)));
    assert!(matches!(engine.toggle_namaz(7).await, Err(EngineError::NoActiveCheckIn)));
}

#[actix_web::test]
async fn toggles_act_on_the_current_day_only() {
    let clock = clock_at(22, 0);
    let engine = AttendanceEngine::new(MemStore::new(), clock.clone(), rules());
    engine.check_in(7, Shift::Night, None).await.unwrap();

    clock.advance(Duration::hours(3));
    let err = engine.toggle_break(7).await;
    assert!(matches!(err, Err(EngineError::NoActiveCheckIn)));
}

/// Store whose pre-write reads come back empty, reproducing the window in
/// which two concurrent writers both pass the application-level check and
/// the storage constraint has to break the tie.
struct BlindStore(MemStore);

#[async_trait]
impl AttendanceStore for BlindStore {
    async fn find_by_key(
        &self,
        _employee_id: u64,
        _date: NaiveDate,
    ) -> Result<Option<AttendanceDayRecord>, StoreError> {
        Ok(None)
    }

    async fn insert(&self, record: &AttendanceDayRecord) -> Result<u64, StoreError> {
        AttendanceStore::insert(&self.0, record).await
    }

    async fn update(&self, record: &AttendanceDayRecord) -> Result<(), StoreError> {
        AttendanceStore::update(&self.0, record).await
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<AttendanceDayRecord>, i64), StoreError> {
        AttendanceStore::list(&self.0, filter).await
    }
}

#[async_trait]
impl LeaveStore for BlindStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        self.0.find_by_id(id).await
    }

    async fn find_active_leave_spans(
        &self,
        _employee_id: u64,
        _statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, request: &LeaveRequest) -> Result<u64, StoreError> {
        LeaveStore::insert(&self.0, request).await
    }

    async fn update(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        LeaveStore::update(&self.0, request).await
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.0.delete(id).await
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        LeaveStore::list(&self.0, filter).await
    }

    async fn query_by_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        self.0.query_by_year(employee_id, year).await
    }
}

#[actix_web::test]
async fn check_in_race_loser_sees_already_checked_in() {
    let clock = clock_at(9, 0);
    let store = MemStore::new();
    let seeded = check_in_record(7, clock.now(), Shift::Morning, None, &rules());
    AttendanceStore::insert(&store, &seeded).await.unwrap();

    let engine = AttendanceEngine::new(BlindStore(store), clock, rules());
    let err = engine.check_in(7, Shift::Morning, None).await;
    assert!(matches!(err, Err(EngineError::AlreadyCheckedIn)));
}

fn raw_request(employee_id: u64, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
    LeaveRequest {
        id: 0,
        employee_id,
        leave_type: LeaveType::Vacation,
        start_date: start,
        end_date: end,
        reason: "trip".into(),
        status: LeaveStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        attachments: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2025, 5, 19, 8, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn create_race_loser_sees_overlapping_leave() {
    let store = MemStore::new();
    LeaveStore::insert(&store, &raw_request(1, day(6, 1), day(6, 5)))
        .await
        .unwrap();

    let clock = ManualClock::at(Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap());
    let engine = LeaveEngine::new(BlindStore(store), clock);
    let err = vacation(&engine, 1, day(6, 3), day(6, 8)).await;
    assert!(matches!(err, Err(EngineError::OverlappingLeave { .. })));
}

#[actix_web::test]
async fn overlapping_request_reports_the_existing_span() {
    let (engine, _clock) = leave_engine();
    vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();

    let err = vacation(&engine, 1, day(6, 4), day(6, 6)).await;
    assert!(matches!(
        err,
        Err(EngineError::OverlappingLeave { start, end }) if start == day(6, 1) && end == day(6, 5)
    ));

    // another employee is free to take the same dates
    vacation(&engine, 2, day(6, 4), day(6, 6)).await.unwrap();
}

#[actix_web::test]
async fn rejected_requests_free_their_span() {
    let (engine, _clock) = leave_engine();
    let first = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();
    engine
        .transition(first.id, hr(), LeaveAction::Reject)
        .await
        .unwrap();
    vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();
}

#[actix_web::test]
async fn inverted_range_is_rejected_on_create() {
    let (engine, _clock) = leave_engine();
    let err = vacation(&engine, 1, day(6, 5), day(6, 1)).await;
    assert!(matches!(err, Err(EngineError::InvalidRange)));
}

#[actix_web::test]
async fn approval_locks_the_request_against_edits() {
    let (engine, _clock) = leave_engine();
    let created = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();

    let approved = engine
        .transition(created.id, hr(), LeaveAction::Approve)
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(42));
    assert!(approved.reviewed_at.is_some());

    let patch = LeavePatch {
        reason: Some("still need it".into()),
        ..LeavePatch::default()
    };
    let err = engine.edit(created.id, employee(1), patch).await;
    assert!(matches!(err, Err(EngineError::NotEditable)));
}

#[actix_web::test]
async fn edit_round_trip_keeps_pending() {
    let (engine, _clock) = leave_engine();
    let created = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();

    let patch = LeavePatch {
        start_date: Some(day(7, 1)),
        end_date: Some(day(7, 3)),
        ..LeavePatch::default()
    };
    let edited = engine.edit(created.id, employee(1), patch).await.unwrap();
    assert_eq!(edited.start_date, day(7, 1));
    assert_eq!(edited.end_date, day(7, 3));
    assert_eq!(edited.status, LeaveStatus::Pending);

    let fetched = engine.get(created.id, employee(1)).await.unwrap();
    assert_eq!(fetched, edited);
}

#[actix_web::test]
async fn edit_overlap_excludes_the_request_itself() {
    let (engine, _clock) = leave_engine();
    let first = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();
    let second = vacation(&engine, 1, day(7, 1), day(7, 3)).await.unwrap();

    // shrinking inside its own span is fine
    let patch = LeavePatch {
        end_date: Some(day(6, 3)),
        ..LeavePatch::default()
    };
    engine.edit(first.id, employee(1), patch).await.unwrap();

    // moving onto the other request is not
    let patch = LeavePatch {
        start_date: Some(day(6, 2)),
        end_date: Some(day(6, 4)),
        ..LeavePatch::default()
    };
    let err = engine.edit(second.id, employee(1), patch).await;
    assert!(matches!(err, Err(EngineError::OverlappingLeave { .. })));
}

#[actix_web::test]
async fn requests_are_invisible_to_strangers() {
    let (engine, _clock) = leave_engine();
    let created = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();

    let err = engine.edit(created.id, employee(99), LeavePatch::default()).await;
    assert!(matches!(err, Err(EngineError::NotFound)));
    let err = engine.get(created.id, employee(99)).await;
    assert!(matches!(err, Err(EngineError::NotFound)));

    // reviewers see everything
    engine.get(created.id, hr()).await.unwrap();
}

#[actix_web::test]
async fn delete_follows_the_permission_matrix() {
    let (engine, _clock) = leave_engine();

    let pending = vacation(&engine, 1, day(6, 1), day(6, 5)).await.unwrap();
    let err = engine.delete(pending.id, employee(99)).await;
    assert!(matches!(err, Err(EngineError::Forbidden { action: "delete" })));
    engine.delete(pending.id, employee(1)).await.unwrap();
    assert!(matches!(
        engine.get(pending.id, employee(1)).await,
        Err(EngineError::NotFound)
    ));

    let approved = vacation(&engine, 1, day(8, 1), day(8, 2)).await.unwrap();
    engine
        .transition(approved.id, hr(), LeaveAction::Approve)
        .await
        .unwrap();
    let err = engine.delete(approved.id, employee(1)).await;
    assert!(matches!(err, Err(EngineError::NotDeletable)));
    engine.delete(approved.id, hr()).await.unwrap();
}

#[actix_web::test]
async fn transition_on_missing_request_is_not_found() {
    let (engine, _clock) = leave_engine();
    let err = engine.transition(404, hr(), LeaveAction::Approve).await;
    assert!(matches!(err, Err(EngineError::NotFound)));
}

#[actix_web::test]
async fn list_paginates_newest_first() {
    let (engine, clock) = leave_engine();
    for month in 1..=3 {
        clock.advance(Duration::minutes(1));
        vacation(&engine, 1, day(month, 1), day(month, 2)).await.unwrap();
    }

    let filter = LeaveFilter {
        employee_id: Some(1),
        per_page: 2,
        ..LeaveFilter::default()
    };
    let (rows, total) = engine.list(&filter).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].start_date, day(3, 1));

    let filter = LeaveFilter {
        employee_id: Some(1),
        per_page: 2,
        page: 2,
        ..LeaveFilter::default()
    };
    let (rows, _) = engine.list(&filter).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].start_date, day(1, 1));
}

#[actix_web::test]
async fn year_stats_cover_only_the_requested_year() {
    let (engine, _clock) = leave_engine();
    let vac = vacation(&engine, 1, day(6, 1), day(6, 3)).await.unwrap();
    engine
        .transition(vac.id, hr(), LeaveAction::Approve)
        .await
        .unwrap();
    engine
        .create(1, LeaveType::Sick, day(9, 1), day(9, 1), "flu".into(), Vec::new())
        .await
        .unwrap();
    engine
        .create(
            1,
            LeaveType::Vacation,
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 24).unwrap(),
            "holidays".into(),
            Vec::new(),
        )
        .await
        .unwrap();

    let stats = engine.year_stats(1, 2025).await.unwrap();
    assert_eq!(stats.len(), 2);
    let vacation_stats = &stats[&LeaveType::Vacation];
    assert_eq!(vacation_stats.total_days, 3);
    assert_eq!(vacation_stats.approved_days, 3);
    assert_eq!(vacation_stats.count, 1);
    let sick = &stats[&LeaveType::Sick];
    assert_eq!(sick.total_days, 1);
    assert_eq!(sick.pending_days, 1);
}
