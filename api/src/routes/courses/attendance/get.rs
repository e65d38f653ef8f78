use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance_report::{AttendanceReport, AttendanceReportAggregator};
use util::state::AppState;

use crate::response::{ApiResponse, error_response};

/// GET /api/courses/{course_id}/attendance
///
/// Presence of every enrolled student across all sessions of the course.
///
/// ```json
/// {
///   "course_id": 1,
///   "columns": [ { "session_id": 4, "created_at": "...", "label": "05/03/2025" } ],
///   "rows": [
///     { "student_id": 7, "registration_no": "9", "name": "Ada",
///       "presence": [true], "attendance_percentage": 100.0 }
///   ]
/// }
/// ```
///
/// Returns `404 Not Found` when the course has no sessions yet.
pub async fn get_report(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceReport>>>) {
    let reports = AttendanceReportAggregator::from_db(state.db_clone());
    match reports.build_report(course_id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(report), "Attendance report built")),
        ),
        Err(e) => error_response(e),
    }
}
