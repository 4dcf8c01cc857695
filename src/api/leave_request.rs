use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::LeaveService;
use crate::auth::auth::AuthUser;
use crate::engine::policy;
use crate::engine::{LeaveAction, LeavePatch};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::store::LeaveFilter;
use crate::utils::stats_cache;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "vacation")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[serde(default)]
    /// References to uploaded documents
    pub attachments: Vec<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "sick")]
    pub leave_type: Option<LeaveType>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Moved the trip by a week")]
    pub reason: Option<String>,
    /// Replaces the stored attachment list when present
    pub attachments: Option<Vec<String>>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    #[schema(example = 123)]
    /// Filter by employee ID (reviewer roles only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = "vacation")]
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    #[schema(example = 2026)]
    /// Year to aggregate, defaults to the current year
    pub year: Option<i32>,
    #[schema(example = 123)]
    /// Employee to aggregate for (reviewer roles only)
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "pending"
         })
        ),
        (status = 400, description = "Invalid range or overlapping leave"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let payload = payload.into_inner();
    let record = engine
        .create(
            employee_id,
            payload.leave_type,
            payload.start_date,
            payload.end_date,
            payload.reason,
            payload.attachments,
        )
        .await?;
    stats_cache::invalidate_span(employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "request": record
    })))
}

/* =========================
Edit leave request (owner, pending only)
========================= */
/// Swagger doc for edit_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body(
        content = UpdateLeave,
        description = "Fields to change; absent fields keep their value",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request updated", body = Object, example = json!({
            "message": "Leave request updated"
        })),
        (status = 400, description = "Not pending, invalid range or overlapping leave"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn edit_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let payload = payload.into_inner();
    let patch = LeavePatch {
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        reason: payload.reason,
        attachments: payload.attachments,
    };

    let record = engine.edit(leave_id, auth.caller(), patch).await?;
    stats_cache::invalidate_span(record.employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request updated",
        "request": record
    })))
}

/* =========================
Delete leave request
========================= */
/// Swagger doc for delete_leave endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 400, description = "Only pending requests may be deleted by their owner"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let record = engine.delete(leave_id, auth.caller()).await?;
    stats_cache::invalidate_span(record.employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request deleted"
    })))
}

/* =========================
Approve leave (reviewer roles)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Request is not pending", body = Object, example = json!({
            "message": "Cannot approve a leave request that is approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let record = engine
        .transition(leave_id, auth.caller(), LeaveAction::Approve)
        .await?;
    stats_cache::invalidate_span(record.employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "request": record
    })))
}

/* =========================
Reject leave (reviewer roles)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Request is not pending", body = Object, example = json!({
            "message": "Cannot reject a leave request that is cancelled"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let record = engine
        .transition(leave_id, auth.caller(), LeaveAction::Reject)
        .await?;
    stats_cache::invalidate_span(record.employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected",
        "request": record
    })))
}

/* =========================
Cancel leave (owner while pending; reviewers any time)
========================= */
/// Swagger doc for cancel_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled successfully", body = Object, example = json!({
            "message": "Leave cancelled"
        })),
        (status = 400, description = "State does not allow cancelling", body = Object, example = json!({
            "message": "Cannot cancel a leave request that is cancelled"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let record = engine
        .transition(leave_id, auth.caller(), LeaveAction::Cancel)
        .await?;
    stats_cache::invalidate_span(record.employee_id, record.start_date, record.end_date).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave cancelled",
        "request": record
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let record = engine.get(leave_id, auth.caller()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    query: web::Query<LeaveQuery>,
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

    let filter = LeaveFilter {
        employee_id,
        status: query.status,
        leave_type: query.leave_type,
        page,
        per_page,
    };
    let (data, total) = engine.list(&filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Per-type leave day totals for one employee and year
#[utoipa::path(
    get,
    path = "/api/v1/leave/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Per-type day totals", body = Object, example = json!({
            "vacation": { "total_days": 8, "approved_days": 5, "pending_days": 3, "count": 2 },
            "sick": { "total_days": 1, "approved_days": 0, "pending_days": 1, "count": 1 }
        })),
        (status = 400, description = "Missing employee context"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_stats(
    auth: AuthUser,
    engine: web::Data<LeaveService>,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if policy::is_reviewer(auth.role) {
        match query.employee_id.or(auth.employee_id) {
            Some(id) => id,
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "employee_id is required"
                })));
            }
        }
    } else {
        auth.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?
    };
    let year = query.year.unwrap_or_else(|| engine.current_year());

    if let Some(stats) = stats_cache::lookup(employee_id, year).await {
        return Ok(HttpResponse::Ok().json(stats));
    }

    let stats = engine.year_stats(employee_id, year).await?;
    stats_cache::store(employee_id, year, stats.clone()).await;

    Ok(HttpResponse::Ok().json(stats))
}
