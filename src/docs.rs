use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, CheckInReq, CheckOutReq,
};
use crate::api::leave_request::{
    CreateLeave, LeaveListResponse, LeaveQuery, StatsQuery, UpdateLeave,
};
use crate::engine::stats::LeaveTypeStats;
use crate::model::attendance::{
    AttendanceDayRecord, AttendanceStatus, Interval, Shift, TaskEntry,
};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Lifecycle

This API tracks the daily attendance cycle of every employee and the full
lifecycle of their leave requests.

### 🔹 Key Features
- **Attendance**
  - Shift-aware check-in with automatic late marking
  - Check-out with worked-hours totals and half-day detection
  - Break and namaz period tracking during the day
- **Leave Management**
  - Apply for leave with overlap protection
  - Approve, reject or cancel requests under a role permission matrix
  - Per-type yearly day totals for dashboards

### 🔐 Security
All non-auth endpoints require **JWT Bearer authentication**.
Review actions are limited to **Superadmin**, **Admin** and **HR** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::toggle_break,
        crate::api::attendance::toggle_namaz,
        crate::api::attendance::today,
        crate::api::attendance::attendance_list,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::edit_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_stats
    ),
    components(
        schemas(
            CheckInReq,
            CheckOutReq,
            AttendanceQuery,
            AttendanceListResponse,
            AttendanceDayRecord,
            Interval,
            TaskEntry,
            Shift,
            AttendanceStatus,
            CreateLeave,
            UpdateLeave,
            LeaveQuery,
            StatsQuery,
            LeaveListResponse,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeaveTypeStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance lifecycle APIs"),
        (name = "Leave", description = "Leave request lifecycle APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
