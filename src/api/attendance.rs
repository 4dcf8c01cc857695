use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::AttendanceService;
use crate::auth::auth::AuthUser;
use crate::engine::policy;
use crate::model::attendance::{AttendanceDayRecord, AttendanceStatus, Shift, TaskEntry};
use crate::store::AttendanceFilter;

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    #[schema(example = "morning")]
    pub shift: Shift,
    #[schema(example = "traffic on the ring road")]
    /// Optional note, usually why the check-in is late
    pub reason: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct CheckOutReq {
    #[schema(example = "leaving for a client visit")]
    pub reason: Option<String>,
    #[serde(default)]
    /// What was worked on during the day
    pub tasks_completed: Vec<TaskEntry>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = 123)]
    /// Filter by employee ID (reviewer roles only)
    pub employee_id: Option<u64>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    /// Records on or after this date
    pub date_from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    /// Records on or before this date
    pub date_to: Option<NaiveDate>,
    #[schema(example = "late")]
    /// Filter by day status
    pub status: Option<AttendanceStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceDayRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body(
        content = CheckInReq,
        description = "Shift to open the day on, plus an optional reason",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Attendance already recorded for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
    payload: web::Json<CheckInReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let payload = payload.into_inner();
    let record = engine
        .check_in(employee_id, payload.shift, payload.reason)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "attendance": record
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body(
        content = CheckOutReq,
        description = "Optional reason and completed tasks; the body may be omitted",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No check-in today or already checked out", body = Object, example = json!({
            "message": "No attendance record found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
    payload: Option<web::Json<CheckOutReq>>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let payload = payload.map(web::Json::into_inner).unwrap_or_default();
    let record = engine
        .check_out(employee_id, payload.reason, payload.tasks_completed)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "attendance": record
    })))
}

/// Break toggle endpoint: opens a break period, or closes the running one
#[utoipa::path(
    put,
    path = "/api/v1/attendance/break",
    responses(
        (status = 200, description = "Break period toggled", body = Object, example = json!({
            "message": "Break started"
        })),
        (status = 400, description = "No check-in today or day already closed", body = Object, example = json!({
            "message": "Attendance record is already closed for the day"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn toggle_break(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let record = engine.toggle_break(employee_id).await?;
    let message = if record.breaks.last().is_some_and(|i| i.is_open()) {
        "Break started"
    } else {
        "Break ended"
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "attendance": record
    })))
}

/// Namaz toggle endpoint: opens a namaz period, or closes the running one
#[utoipa::path(
    put,
    path = "/api/v1/attendance/namaz",
    responses(
        (status = 200, description = "Namaz period toggled", body = Object, example = json!({
            "message": "Namaz started"
        })),
        (status = 400, description = "No check-in today or day already closed", body = Object, example = json!({
            "message": "Attendance record is already closed for the day"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn toggle_namaz(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let record = engine.toggle_namaz(employee_id).await?;
    let message = if record.namaz.last().is_some_and(|i| i.is_open()) {
        "Namaz started"
    } else {
        "Namaz ended"
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "attendance": record
    })))
}

/// Today's attendance for the logged-in employee
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record", body = AttendanceDayRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No record yet today", body = Object, example = json!({
            "message": "No attendance record for today"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    match engine.today(employee_id).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No attendance record for today"
        }))),
    }
}

/// Attendance history endpoint. Employees see their own records; reviewer
/// roles may filter across employees.
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    auth: AuthUser,
    engine: web::Data<AttendanceService>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);

    let employee_id = if policy::is_reviewer(auth.role) {
        query.employee_id
    } else {
        Some(auth.employee_id.ok_or_else(|| {
            actix_web::error::ErrorForbidden("No employee profile")
        })?)
    };

    let filter = AttendanceFilter {
        employee_id,
        date_from: query.date_from,
        date_to: query.date_to,
        status: query.status,
        page,
        per_page,
    };
    let (data, total) = engine.list(&filter).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
