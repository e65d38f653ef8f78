use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

use crate::auth::guards::require_course_teacher;

mod get;
mod post;

pub use get::get_report;
pub use post::send_report;

/// `/courses/{course_id}/attendance`, teacher of the course only.
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_report)
                .post(send_report)
                .route_layer(from_fn_with_state(app_state.clone(), require_course_teacher)),
        )
        .with_state(app_state)
}
