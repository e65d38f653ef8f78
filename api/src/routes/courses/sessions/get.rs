//! Read-only session routes.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use services::attendance_report::{AttendanceReportAggregator, SessionRoster};
use services::attendance_session::{SessionFilter, SessionStore};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, error_response};

use super::common::{ListQuery, SessionResponse, session_in_course};

/// GET /api/courses/{course_id}/sessions
///
/// Sessions of a course, newest first.
///
/// **Auth**: course member. Students only see sessions they attended; other
/// callers may narrow the list with `?student_id=` and `?active=`.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<ListQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionResponse>>>) {
    let principal = user.principal();
    let student_id = if principal.is_student() {
        Some(principal.id)
    } else {
        q.student_id
    };

    let store = SessionStore::from_db(state.db_clone());
    let filter = SessionFilter {
        course_id,
        student_id,
        active: q.active,
    };

    match store.list(&filter).await {
        Ok(sessions) => {
            let data: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
            let message = format!("Available sessions found: {}", data.len());
            (StatusCode::OK, Json(ApiResponse::success(data, message)))
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/courses/{course_id}/sessions/{session_id}
///
/// The session and every enrolled student with their presence, ordered by
/// registration number.
///
/// **Auth**: teacher of the course (or admin).
pub async fn get_session(
    State(state): State<AppState>,
    Path((course_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<SessionRoster>>>) {
    let store = SessionStore::from_db(state.db_clone());
    if let Err(e) = session_in_course(&store, course_id, session_id).await {
        return error_response(e);
    }

    let reports = AttendanceReportAggregator::from_db(state.db_clone());
    match reports.session_roster(session_id).await {
        Ok(roster) => {
            let present = roster.students.iter().filter(|s| s.present).count();
            let message = format!("{present} student(s) present");
            (StatusCode::OK, Json(ApiResponse::success(Some(roster), message)))
        }
        Err(e) => error_response(e),
    }
}
