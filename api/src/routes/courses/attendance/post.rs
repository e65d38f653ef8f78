use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use services::attendance_report::AttendanceReportAggregator;
use services::notification::DbNotificationSink;
use util::state::AppState;

use crate::response::{ApiResponse, error_response};

/// POST /api/courses/{course_id}/attendance
///
/// Queues the attendance report for e-mail delivery to the course teacher.
/// Responds `202 Accepted` once the job is queued.
pub async fn send_report(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let reports = AttendanceReportAggregator::from_db(state.db_clone());
    let sink = DbNotificationSink::new(state.db_clone());

    match reports.send_report(course_id, &sink).await {
        Ok(message) => (StatusCode::ACCEPTED, Json(ApiResponse::success((), message))),
        Err(e) => error_response(e),
    }
}
