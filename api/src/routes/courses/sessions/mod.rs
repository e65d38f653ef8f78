//! `/courses/{course_id}/sessions`
//!
//! | method | path                    | guard   | action                                 |
//! |--------|-------------------------|---------|----------------------------------------|
//! | POST   | `/`                     | teacher | start a session                        |
//! | GET    | `/`                     | member  | list sessions (students: attended only)|
//! | PUT    | `/active`               | member  | teacher dismisses, student checks in   |
//! | GET    | `/{session_id}`         | teacher | session with its roster                |
//! | PUT    | `/{session_id}`         | teacher | bulk attendance correction             |
//! | DELETE | `/{session_id}`         | teacher | delete a session                       |

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::guards::{require_course_member, require_course_teacher};

mod common;
mod delete;
mod get;
mod post;
mod put;

pub use common::{
    ActiveSessionReq, BulkMarkReq, CreateSessionReq, ListQuery, LocationReq, SessionResponse,
};
pub use delete::delete_session;
pub use get::{get_session, list_sessions};
pub use post::create_session;
pub use put::{bulk_mark, update_active_session};

pub fn sessions_routes(app_state: AppState) -> Router<AppState> {
    let teacher = from_fn_with_state(app_state.clone(), require_course_teacher);
    let member = from_fn_with_state(app_state.clone(), require_course_member);

    Router::new()
        .route("/", get(list_sessions).route_layer(member.clone()))
        .route("/", post(create_session).route_layer(teacher.clone()))
        .route("/active", put(update_active_session).route_layer(member))
        .route(
            "/{session_id}",
            get(get_session)
                .put(bulk_mark)
                .delete(delete_session)
                .route_layer(teacher),
        )
        .with_state(app_state)
}
