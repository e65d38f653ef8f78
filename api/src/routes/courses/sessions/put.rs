use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance_ledger::AttendanceLedger;
use services::attendance_session::SessionStore;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, error_response};
use crate::routes::common::format_validation_errors;

use super::common::{ActiveSessionReq, BulkMarkReq, session_in_course};

/// PUT /api/courses/{course_id}/sessions/active
///
/// Role-dependent action on the course's running session:
/// - **teacher**: dismisses it (body ignored)
/// - **student**: checks in at `center`, which is required and must lie
///   within the session's radius
///
/// ### Responses
/// - `200 OK` with a confirmation message
/// - `400 Bad Request` when a student omits `center` or is too far away
/// - `403 Forbidden` for admins
/// - `404 Not Found` when no session is running
/// - `409 Conflict` when the student is already marked
pub async fn update_active_session(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<ActiveSessionReq>>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let principal = user.principal();
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let result = if principal.is_student() {
        let Some(center) = body.center else {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Location is required to check in")),
            );
        };
        if let Err(validation_errors) = center.validate() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format_validation_errors(&validation_errors))),
            );
        }
        AttendanceLedger::new(state.db_clone())
            .check_in(course_id, principal.id, center.into())
            .await
    } else {
        SessionStore::from_db(state.db_clone())
            .dismiss(course_id, &principal)
            .await
    };

    match result {
        Ok(message) => (StatusCode::OK, Json(ApiResponse::success((), message))),
        Err(e) => error_response(e),
    }
}

/// PUT /api/courses/{course_id}/sessions/{session_id}
///
/// Teacher correction of a session roster:
///
/// ```json
/// { "marks": [ { "student_id": 7, "present": true }, { "student_id": 9, "present": false } ] }
/// ```
///
/// Works on running and closed sessions alike.
pub async fn bulk_mark(
    State(state): State<AppState>,
    Path((course_id, session_id)): Path<(i64, i64)>,
    Json(body): Json<BulkMarkReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    if let Err(validation_errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    let store = SessionStore::from_db(state.db_clone());
    if let Err(e) = session_in_course(&store, course_id, session_id).await {
        return error_response(e);
    }

    match AttendanceLedger::new(state.db_clone())
        .bulk_mark(session_id, &body.marks)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Attendance updated successfully")),
        ),
        Err(e) => error_response(e),
    }
}
