use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceFilter, AttendanceStore, LeaveFilter, LeaveStore, StoreError};
use crate::model::attendance::{AttendanceDayRecord, Interval, TaskEntry};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

const SELECT_ATTENDANCE: &str = "SELECT id, employee_id, date, shift, check_in, check_out, \
     check_in_reason, check_out_reason, status, breaks, namaz, total_break_minutes, \
     total_namaz_minutes, total_hours, tasks_completed FROM attendance";

const SELECT_LEAVE: &str = "SELECT id, employee_id, leave_type, start_date, end_date, reason, \
     status, reviewed_by, reviewed_at, attachments, created_at FROM leave_requests";

/// MySQL-backed store over the `attendance` and `leave_requests` tables.
///
/// `attendance` carries a unique key on `(employee_id, date)`, which is what
/// turns a lost check-in race into [`StoreError::Duplicate`]. Interval
/// sequences, task lists and attachments live in JSON columns so each record
/// updates as one row. Leave inserts re-check overlap under `FOR UPDATE`
/// inside a transaction as the storage-side backstop.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(err)
}

fn parse_enum<T: FromStr>(value: &str) -> Result<T, StoreError> {
    T::from_str(value).map_err(|_| StoreError::Decode(format!("unknown enum value `{value}`")))
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Date(NaiveDate),
    Str(&'a str),
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    shift: String,
    check_in: DateTime<Utc>,
    check_out: Option<DateTime<Utc>>,
    check_in_reason: Option<String>,
    check_out_reason: Option<String>,
    status: String,
    breaks: Json<Vec<Interval>>,
    namaz: Json<Vec<Interval>>,
    total_break_minutes: f64,
    total_namaz_minutes: f64,
    total_hours: Option<f64>,
    tasks_completed: Json<Vec<TaskEntry>>,
}

impl TryFrom<AttendanceRow> for AttendanceDayRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            shift: parse_enum(&row.shift)?,
            check_in: row.check_in,
            check_out: row.check_out,
            check_in_reason: row.check_in_reason,
            check_out_reason: row.check_out_reason,
            status: parse_enum(&row.status)?,
            breaks: row.breaks.0,
            namaz: row.namaz.0,
            total_break_minutes: row.total_break_minutes,
            total_namaz_minutes: row.total_namaz_minutes,
            total_hours: row.total_hours,
            tasks_completed: row.tasks_completed.0,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    reviewed_by: Option<u64>,
    reviewed_at: Option<DateTime<Utc>>,
    attachments: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: parse_enum(&row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_enum(&row.status)?,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            attachments: row.attachments.0,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_by_key(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceDayRecord>, StoreError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE employee_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, record: &AttendanceDayRecord) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, shift, check_in, check_out, check_in_reason,
                 check_out_reason, status, breaks, namaz, total_break_minutes,
                 total_namaz_minutes, total_hours, tasks_completed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.shift.as_ref())
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(&record.check_in_reason)
        .bind(&record.check_out_reason)
        .bind(record.status.as_ref())
        .bind(Json(&record.breaks))
        .bind(Json(&record.namaz))
        .bind(record.total_break_minutes)
        .bind(record.total_namaz_minutes)
        .bind(record.total_hours)
        .bind(Json(&record.tasks_completed))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.last_insert_id())
    }

    async fn update(&self, record: &AttendanceDayRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE attendance
            SET shift = ?, check_in = ?, check_out = ?, check_in_reason = ?,
                check_out_reason = ?, status = ?, breaks = ?, namaz = ?,
                total_break_minutes = ?, total_namaz_minutes = ?, total_hours = ?,
                tasks_completed = ?
            WHERE id = ?
            "#,
        )
        .bind(record.shift.as_ref())
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(&record.check_in_reason)
        .bind(&record.check_out_reason)
        .bind(record.status.as_ref())
        .bind(Json(&record.breaks))
        .bind(Json(&record.namaz))
        .bind(record.total_break_minutes)
        .bind(record.total_namaz_minutes)
        .bind(record.total_hours)
        .bind(Json(&record.tasks_completed))
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<(Vec<AttendanceDayRecord>, i64), StoreError> {
        let offset = filter.page.saturating_sub(1) * filter.per_page;

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(from) = filter.date_from {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = filter.date_to {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(to));
        }
        if let Some(status) = filter.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM attendance{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Date(d) => count_q.bind(*d),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        let data_sql =
            format!("{SELECT_ATTENDANCE}{where_sql} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?");
        let mut data_q = sqlx::query_as::<_, AttendanceRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Date(d) => data_q.bind(d),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(filter.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        let records = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, total))
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("{SELECT_LEAVE} WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_active_leave_spans(
        &self,
        employee_id: u64,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!("{SELECT_LEAVE} WHERE employee_id = ? AND status IN ({placeholders})");
        let mut query = sqlx::query_as::<_, LeaveRow>(&sql).bind(employee_id);
        for status in statuses {
            query = query.bind(status.as_ref());
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert(&self, request: &LeaveRequest) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Database)?;

        // Overlap backstop: lock the employee's active rows in the span and
        // re-check under the transaction before inserting.
        let conflicts: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE employee_id = ?
            AND status IN ('pending', 'approved')
            AND start_date <= ? AND end_date >= ?
            FOR UPDATE
            "#,
        )
        .bind(request.employee_id)
        .bind(request.end_date)
        .bind(request.start_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::Database)?;
        if conflicts > 0 {
            return Err(StoreError::Duplicate);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason, status,
                 reviewed_by, reviewed_at, attachments, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status.as_ref())
        .bind(request.reviewed_by)
        .bind(request.reviewed_at)
        .bind(Json(&request.attachments))
        .bind(request.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        let id = result.last_insert_id();

        tx.commit().await.map_err(StoreError::Database)?;
        Ok(id)
    }

    async fn update(&self, request: &LeaveRequest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE leave_requests
            SET leave_type = ?, start_date = ?, end_date = ?, reason = ?,
                status = ?, reviewed_by = ?, reviewed_at = ?, attachments = ?
            WHERE id = ?
            "#,
        )
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status.as_ref())
        .bind(request.reviewed_by)
        .bind(request.reviewed_at)
        .bind(Json(&request.attachments))
        .bind(request.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        Ok(())
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let offset = filter.page.saturating_sub(1) * filter.per_page;

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(status) = filter.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }
        if let Some(leave_type) = filter.leave_type.as_ref() {
            where_sql.push_str(" AND leave_type = ?");
            args.push(FilterValue::Str(leave_type.as_ref()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Date(d) => count_q.bind(*d),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        let data_sql =
            format!("{SELECT_LEAVE}{where_sql} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Date(d) => data_q.bind(d),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(filter.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        let requests = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((requests, total))
    }

    async fn query_by_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!("{SELECT_LEAVE} WHERE employee_id = ? AND YEAR(start_date) = ?");
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(year)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::attendance::{AttendanceStatus, Shift};
    use crate::model::leave_request::LeaveType;

    fn attendance_row(status: &str) -> AttendanceRow {
        AttendanceRow {
            id: 3,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            shift: "morning".into(),
            check_in: Utc.with_ymd_and_hms(2025, 3, 10, 9, 10, 0).unwrap(),
            check_out: None,
            check_in_reason: None,
            check_out_reason: None,
            status: status.into(),
            breaks: Json(Vec::new()),
            namaz: Json(Vec::new()),
            total_break_minutes: 0.0,
            total_namaz_minutes: 0.0,
            total_hours: None,
            tasks_completed: Json(Vec::new()),
        }
    }

    #[test]
    fn enum_columns_round_trip_through_their_wire_names() {
        assert!(matches!(
            parse_enum::<AttendanceStatus>("half-day"),
            Ok(AttendanceStatus::HalfDay)
        ));
        assert!(matches!(parse_enum::<Shift>("night"), Ok(Shift::Night)));
        assert!(matches!(
            parse_enum::<LeaveType>("bereavement"),
            Ok(LeaveType::Bereavement)
        ));
        assert_eq!(AttendanceStatus::HalfDay.as_ref(), "half-day");
        assert_eq!(LeaveStatus::Pending.as_ref(), "pending");
    }

    #[test]
    fn unknown_enum_value_is_a_decode_error() {
        let err = parse_enum::<AttendanceStatus>("on-strike");
        assert!(matches!(err, Err(StoreError::Decode(_))));
    }

    #[test]
    fn rows_convert_into_domain_records() {
        let record = AttendanceDayRecord::try_from(attendance_row("late")).unwrap();
        assert_eq!(record.shift, Shift::Morning);
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn corrupt_status_column_fails_the_conversion() {
        let err = AttendanceDayRecord::try_from(attendance_row("stuck-in-lift"));
        assert!(matches!(err, Err(StoreError::Decode(_))));
    }
}
