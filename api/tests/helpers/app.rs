use api::{auth::generate_jwt, routes::routes};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use db::models::{course, course_student, user};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::{config, state::AppState};

pub const TEST_JWT_SECRET: &str = "attendance-test-secret";

/// Router over a fresh, migrated in-memory database.
pub async fn make_test_app() -> (Router, AppState) {
    config::AppConfig::set_jwt_secret(TEST_JWT_SECRET);

    let app_state = AppState::new(setup_test_db().await);
    let router = Router::new()
        .nest("/api", routes(app_state.clone()))
        .with_state(app_state.clone());

    (router, app_state)
}

pub struct Ctx {
    pub teacher: user::Model,
    pub other_teacher: user::Model,
    pub admin: user::Model,
    pub course: course::Model,
    /// Enrolled, registration numbers `"10"`, `"9"`, `"100"`.
    pub students: Vec<user::Model>,
    /// A student not enrolled in `course`.
    pub outsider: user::Model,
}

impl Ctx {
    pub fn token(user: &user::Model) -> String {
        generate_jwt(user.id, user.role).unwrap().0
    }
}

pub async fn seed(db: &DatabaseConnection) -> Ctx {
    let teacher = user::Model::create(db, "Grace", "grace@test.com", None, user::Role::Teacher)
        .await
        .unwrap();
    let other_teacher = user::Model::create(db, "Alan", "alan@test.com", None, user::Role::Teacher)
        .await
        .unwrap();
    let admin = user::Model::create(db, "Root", "root@test.com", None, user::Role::Admin)
        .await
        .unwrap();
    let course = course::Model::create(db, "Networks", "NET301", teacher.id)
        .await
        .unwrap();
    course::Model::create(db, "Compilers", "CMP302", other_teacher.id)
        .await
        .unwrap();

    let mut students = Vec::new();
    for (name, reg) in [("Xavier", "10"), ("Yara", "9"), ("Zane", "100")] {
        let email = format!("{}@test.com", name.to_lowercase());
        let s = user::Model::create(db, name, &email, Some(reg), user::Role::Student)
            .await
            .unwrap();
        course_student::Model::enroll(db, course.id, s.id).await.unwrap();
        students.push(s);
    }

    let outsider = user::Model::create(db, "Olive", "olive@test.com", Some("77"), user::Role::Student)
        .await
        .unwrap();

    Ctx {
        teacher,
        other_teacher,
        admin,
        course,
        students,
        outsider,
    }
}

/// Sends one request and returns the status with the parsed JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
