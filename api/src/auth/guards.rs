use std::collections::HashMap;

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{course, course_student};
use sea_orm::DatabaseConnection;
use services::principal::Role;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

/// Authenticates the request and stores the `AuthUser` in its extensions for
/// handlers to pick up with `Extension<AuthUser>`.
async fn extract_and_insert_authuser(
    mut req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn course_id_param(params: &HashMap<String, String>) -> Result<i64, GuardError> {
    params
        .get("course_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing or invalid course_id")),
        ))
}

/// How the caller relates to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CourseAccess {
    Teacher,
    Student,
    None,
}

async fn course_access(
    db: &DatabaseConnection,
    user: &AuthUser,
    course_id: i64,
) -> CourseAccess {
    let lookup = match user.0.role {
        Role::Teacher => course::Model::is_taught_by(db, course_id, user.0.sub)
            .await
            .map(|ok| if ok { CourseAccess::Teacher } else { CourseAccess::None }),
        Role::Student => course_student::Model::is_enrolled(db, course_id, user.0.sub)
            .await
            .map(|ok| if ok { CourseAccess::Student } else { CourseAccess::None }),
        Role::Admin => Ok(CourseAccess::None),
    };

    lookup.unwrap_or_else(|e| {
        // Deny on DB error.
        tracing::warn!(
            error = %e,
            user_id = user.0.sub,
            course_id,
            "DB error while checking course access; denying access"
        );
        CourseAccess::None
    })
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

/// Allows the teacher of `{course_id}` and admins.
pub async fn require_course_teacher(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let course_id = course_id_param(&params)?;

    if user.0.role == Role::Admin
        || course_access(app_state.db(), &user, course_id).await == CourseAccess::Teacher
    {
        return Ok(next.run(req).await);
    }

    Err((
        StatusCode::FORBIDDEN,
        Json(ApiResponse::error("Teacher access required for this course")),
    ))
}

/// Allows the teacher of `{course_id}`, its enrolled students and admins.
pub async fn require_course_member(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let course_id = course_id_param(&params)?;

    if user.0.role == Role::Admin
        || course_access(app_state.db(), &user, course_id).await != CourseAccess::None
    {
        return Ok(next.run(req).await);
    }

    Err((
        StatusCode::FORBIDDEN,
        Json(ApiResponse::error("You are not a member of this course")),
    ))
}
