//! HTTP route entry point for `/api/...`.
//!
//! - `/health` → health check (public)
//! - `/courses/{course_id}/sessions` → attendance sessions, check-in and
//!   roster corrections (authenticated, course-scoped guards per route)
//! - `/courses/{course_id}/attendance` → attendance report (course teacher)

use crate::auth::guards::allow_authenticated;
use crate::routes::{courses::courses_routes, health::health_routes};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod common;
pub mod courses;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/courses",
            courses_routes(app_state.clone()).route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
