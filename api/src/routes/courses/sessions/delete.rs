use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance_session::SessionStore;
use util::state::AppState;

use crate::response::{ApiResponse, error_response};

use super::common::session_in_course;

/// DELETE /api/courses/{course_id}/sessions/{session_id}
///
/// Deletes a session with its roster. Deleting the running session also ends
/// it for the course.
///
/// **Auth**: teacher of the course (or admin).
pub async fn delete_session(
    State(state): State<AppState>,
    Path((course_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let store = SessionStore::from_db(state.db_clone());

    let result = match session_in_course(&store, course_id, session_id).await {
        Ok(_) => store.remove(session_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Session deleted successfully")),
        ),
        Err(e) => error_response(e),
    }
}
