use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::engine::{AttendanceEngine, EngineError, LeaveEngine, SystemClock};
use crate::store::mysql::MySqlStore;

pub mod attendance;
pub mod leave_request;

/// Engine instances as wired at startup and shared through app data.
pub type AttendanceService = AttendanceEngine<MySqlStore, SystemClock>;
pub type LeaveService = LeaveEngine<MySqlStore, SystemClock>;

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::NotFound => StatusCode::NOT_FOUND,
            EngineError::Forbidden { .. } => StatusCode::FORBIDDEN,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Store(err) = self {
            tracing::error!(error = %err, "storage failure behind request");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn engine_errors_map_to_expected_status_codes() {
        assert_eq!(EngineError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            EngineError::Forbidden { action: "approve" }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            EngineError::AlreadyCheckedIn.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EngineError::Store(StoreError::Duplicate).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn store_details_never_leak_into_the_body() {
        let body = EngineError::Store(StoreError::Decode("bad status".into())).error_response();
        let bytes = actix_web::body::to_bytes(body.into_body()).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("bad status"));
    }
}
