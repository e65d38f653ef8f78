use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance_session::SessionStore;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, error_response};
use crate::routes::common::format_validation_errors;

use super::common::{CreateSessionReq, SessionResponse};

/// POST /api/courses/{course_id}/sessions
///
/// Starts an attendance session centred on `center`. The radius defaults to
/// `DEFAULT_RADIUS_METERS`. The session closes itself after
/// `SESSION_TTL_SECONDS` unless dismissed earlier.
///
/// **Auth**: teacher of the course (or admin).
///
/// ### Responses
/// - `201 Created` with the new session
/// - `400 Bad Request` on invalid coordinates or radius
/// - `404 Not Found` when the course does not exist
/// - `409 Conflict` when the course already has an active session
pub async fn create_session(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(body): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<Option<SessionResponse>>>) {
    if let Err(validation_errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    let store = SessionStore::from_db(state.db_clone());
    match store
        .create(course_id, body.center.into(), body.radius_meters)
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                Some(SessionResponse::from(session)),
                "Session started successfully",
            )),
        ),
        Err(e) => error_response(e),
    }
}
