use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod sessions;

use attendance::attendance_routes;
use sessions::sessions_routes;

/// Routes nested under `/courses/{course_id}`.
pub fn courses_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/{course_id}/sessions", sessions_routes(app_state.clone()))
        .nest("/{course_id}/attendance", attendance_routes(app_state))
}
