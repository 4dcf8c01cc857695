use chrono::{DateTime, NaiveTime, Utc};

use super::clock::Clock;
use super::error::EngineError;
use super::interval::{self, IntervalKind};
use crate::model::attendance::{AttendanceDayRecord, AttendanceStatus, Shift, TaskEntry};
use crate::store::{AttendanceFilter, AttendanceStore, StoreError};

/// Per-shift start times used for the late check, plus the worked-hours
/// threshold under which a day is downgraded to half-day.
#[derive(Debug, Clone)]
pub struct ShiftRules {
    pub morning_start: NaiveTime,
    pub evening_start: NaiveTime,
    pub night_start: NaiveTime,
    pub half_day_hours: f64,
}

impl ShiftRules {
    pub fn start_of(&self, shift: Shift) -> NaiveTime {
        match shift {
            Shift::Morning => self.morning_start,
            Shift::Evening => self.evening_start,
            Shift::Night => self.night_start,
        }
    }
}

/// Builds the record a successful check-in persists. The calendar date is
/// the date component of `now`; a check-in strictly after the shift start
/// comes in as late.
pub fn check_in_record(
    employee_id: u64,
    now: DateTime<Utc>,
    shift: Shift,
    reason: Option<String>,
    rules: &ShiftRules,
) -> AttendanceDayRecord {
    let status = if now.time() > rules.start_of(shift) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };
    AttendanceDayRecord {
        id: 0,
        employee_id,
        date: now.date_naive(),
        shift,
        check_in: now,
        check_out: None,
        check_in_reason: reason,
        check_out_reason: None,
        status,
        breaks: Vec::new(),
        namaz: Vec::new(),
        total_break_minutes: 0.0,
        total_namaz_minutes: 0.0,
        total_hours: None,
        tasks_completed: Vec::new(),
    }
}

/// Terminal transition for the day: sets the check-out instant, the reason
/// and the completed tasks, computes total hours and downgrades short days
/// to half-day. Open break or namaz intervals are left as they are; further
/// toggles are rejected once the record is closed.
pub fn apply_check_out(
    record: &AttendanceDayRecord,
    now: DateTime<Utc>,
    reason: Option<String>,
    tasks: Vec<TaskEntry>,
    rules: &ShiftRules,
) -> Result<AttendanceDayRecord, EngineError> {
    if record.is_checked_out() {
        return Err(EngineError::AlreadyCheckedOut);
    }
    if now < record.check_in {
        return Err(EngineError::InvalidRange);
    }
    let mut next = record.clone();
    next.check_out = Some(now);
    next.check_out_reason = reason;
    next.tasks_completed = tasks;
    let total_hours = (now - record.check_in).num_milliseconds() as f64 / 3_600_000.0;
    next.total_hours = Some(total_hours);
    if total_hours < rules.half_day_hours {
        next.status = AttendanceStatus::HalfDay;
    }
    Ok(next)
}

/// One break/namaz toggle: opens a fresh interval when none is open, closes
/// the open one and adds its minutes to the running total otherwise. The two
/// sequences toggle independently of each other.
pub fn apply_toggle(
    record: &AttendanceDayRecord,
    now: DateTime<Utc>,
    kind: IntervalKind,
) -> Result<AttendanceDayRecord, EngineError> {
    if record.is_checked_out() {
        return Err(EngineError::RecordAlreadyClosed);
    }
    let mut next = record.clone();
    match kind {
        IntervalKind::Break => {
            if interval::is_open(&next.breaks) {
                let (sequence, minutes) = interval::close(&next.breaks, now, kind)?;
                next.breaks = sequence;
                next.total_break_minutes += minutes;
            } else {
                next.breaks = interval::open(&next.breaks, now, kind)?;
            }
        }
        IntervalKind::Namaz => {
            if interval::is_open(&next.namaz) {
                let (sequence, minutes) = interval::close(&next.namaz, now, kind)?;
                next.namaz = sequence;
                next.total_namaz_minutes += minutes;
            } else {
                next.namaz = interval::open(&next.namaz, now, kind)?;
            }
        }
    }
    Ok(next)
}

/// Attendance day lifecycle over an abstract store and clock. All mutating
/// paths validate against the freshly loaded record, apply a pure transition
/// and persist the full result in one store call.
pub struct AttendanceEngine<S, C> {
    store: S,
    clock: C,
    rules: ShiftRules,
}

impl<S: AttendanceStore, C: Clock> AttendanceEngine<S, C> {
    pub fn new(store: S, clock: C, rules: ShiftRules) -> Self {
        Self { store, clock, rules }
    }

    /// Sole creation path for a day record. The storage-level unique key on
    /// `(employee_id, date)` closes the race two concurrent check-ins would
    /// otherwise win together.
    pub async fn check_in(
        &self,
        employee_id: u64,
        shift: Shift,
        reason: Option<String>,
    ) -> Result<AttendanceDayRecord, EngineError> {
        let now = self.clock.now();
        if self
            .store
            .find_by_key(employee_id, now.date_naive())
            .await?
            .is_some()
        {
            return Err(EngineError::AlreadyCheckedIn);
        }
        let mut record = check_in_record(employee_id, now, shift, reason, &self.rules);
        let id = self.store.insert(&record).await.map_err(|err| match err {
            StoreError::Duplicate => EngineError::AlreadyCheckedIn,
            other => EngineError::Store(other),
        })?;
        record.id = id;
        Ok(record)
    }

    pub async fn check_out(
        &self,
        employee_id: u64,
        reason: Option<String>,
        tasks: Vec<TaskEntry>,
    ) -> Result<AttendanceDayRecord, EngineError> {
        let record = self.today_record(employee_id).await?;
        let next = apply_check_out(&record, self.clock.now(), reason, tasks, &self.rules)?;
        self.store.update(&next).await?;
        Ok(next)
    }

    pub async fn toggle_break(&self, employee_id: u64) -> Result<AttendanceDayRecord, EngineError> {
        self.toggle(employee_id, IntervalKind::Break).await
    }

    pub async fn toggle_namaz(&self, employee_id: u64) -> Result<AttendanceDayRecord, EngineError> {
        self.toggle(employee_id, IntervalKind::Namaz).await
    }

    async fn toggle(
        &self,
        employee_id: u64,
        kind: IntervalKind,
    ) -> Result<AttendanceDayRecord, EngineError> {
        let record = self.today_record(employee_id).await?;
        let next = apply_toggle(&record, self.clock.now(), kind)?;
        self.store.update(&next).await?;
        Ok(next)
    }

    pub async fn today(&self, employee_id: u64) -> Result<Option<AttendanceDayRecord>, EngineError> {
        Ok(self.store.find_by_key(employee_id, self.clock.today()).await?)
    }

    pub async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<AttendanceDayRecord>, i64), EngineError> {
        Ok(self.store.list(filter).await?)
    }

    async fn today_record(&self, employee_id: u64) -> Result<AttendanceDayRecord, EngineError> {
        self.store
            .find_by_key(employee_id, self.clock.today())
            .await?
            .ok_or(EngineError::NoActiveCheckIn)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn rules() -> ShiftRules {
        ShiftRules {
            morning_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            evening_start: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            night_start: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            half_day_hours: 4.0,
        }
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap()
    }

    #[test]
    fn check_in_after_shift_start_is_late() {
        let record = check_in_record(7, at(9, 10), Shift::Morning, None, &rules());
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.date, at(9, 10).date_naive());
    }

    #[test]
    fn check_in_at_shift_start_is_present() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[test]
    fn evening_shift_uses_its_own_threshold() {
        let record = check_in_record(7, at(16, 45), Shift::Evening, None, &rules());
        assert_eq!(record.status, AttendanceStatus::Present);
        let record = check_in_record(7, at(17, 1), Shift::Evening, None, &rules());
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn short_day_downgrades_to_half_day() {
        let record = check_in_record(7, at(9, 10), Shift::Morning, None, &rules());
        let closed = apply_check_out(&record, at(12, 10), None, Vec::new(), &rules()).unwrap();
        let hours = closed.total_hours.unwrap();
        assert!((hours - 3.0).abs() < 1e-9);
        assert_eq!(closed.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn full_day_keeps_late_status() {
        let record = check_in_record(7, at(9, 10), Shift::Morning, None, &rules());
        let closed = apply_check_out(&record, at(17, 30), None, Vec::new(), &rules()).unwrap();
        assert_eq!(closed.status, AttendanceStatus::Late);
        assert!(closed.total_hours.unwrap() > 4.0);
    }

    #[test]
    fn second_check_out_is_rejected_and_changes_nothing() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let closed = apply_check_out(&record, at(17, 0), None, Vec::new(), &rules()).unwrap();
        let hours = closed.total_hours.unwrap();
        let err = apply_check_out(&closed, at(18, 0), None, Vec::new(), &rules());
        assert!(matches!(err, Err(EngineError::AlreadyCheckedOut)));
        assert_eq!(closed.total_hours.unwrap(), hours);
    }

    #[test]
    fn check_out_before_check_in_is_invalid() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let err = apply_check_out(&record, at(8, 59), None, Vec::new(), &rules());
        assert!(matches!(err, Err(EngineError::InvalidRange)));
    }

    #[test]
    fn break_toggle_opens_then_closes_with_minutes() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let opened = apply_toggle(&record, at(11, 0), IntervalKind::Break).unwrap();
        assert!(interval::is_open(&opened.breaks));
        let closed = apply_toggle(&opened, at(11, 0) + Duration::minutes(15), IntervalKind::Break).unwrap();
        assert_eq!(closed.breaks.len(), 1);
        assert!(!interval::is_open(&closed.breaks));
        assert!((closed.total_break_minutes - 15.0).abs() < 1e-9);
    }

    #[test]
    fn break_and_namaz_may_be_open_at_the_same_time() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let with_break = apply_toggle(&record, at(10, 0), IntervalKind::Break).unwrap();
        let with_both = apply_toggle(&with_break, at(10, 5), IntervalKind::Namaz).unwrap();
        assert!(interval::is_open(&with_both.breaks));
        assert!(interval::is_open(&with_both.namaz));
    }

    #[test]
    fn toggles_are_rejected_after_check_out() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let closed = apply_check_out(&record, at(17, 0), None, Vec::new(), &rules()).unwrap();
        let err = apply_toggle(&closed, at(17, 30), IntervalKind::Break);
        assert!(matches!(err, Err(EngineError::RecordAlreadyClosed)));
    }

    #[test]
    fn closed_totals_accumulate_across_breaks() {
        let record = check_in_record(7, at(9, 0), Shift::Morning, None, &rules());
        let record = apply_toggle(&record, at(10, 0), IntervalKind::Break).unwrap();
        let record = apply_toggle(&record, at(10, 10), IntervalKind::Break).unwrap();
        let record = apply_toggle(&record, at(14, 0), IntervalKind::Break).unwrap();
        let record = apply_toggle(&record, at(14, 20), IntervalKind::Break).unwrap();
        assert_eq!(record.breaks.len(), 2);
        assert!((record.total_break_minutes - 30.0).abs() < 1e-9);
    }
}
