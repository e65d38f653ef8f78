#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::models::{attendance_session, course};
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use serde_json::json;
    use serial_test::serial;

    use crate::helpers::{Ctx, make_test_app, seed, send};

    fn sessions_uri(ctx: &Ctx) -> String {
        format!("/api/courses/{}/sessions", ctx.course.id)
    }

    fn nyc() -> serde_json::Value {
        json!({ "latitude": 40.7128, "longitude": -74.0060 })
    }

    async fn start_session(app: &axum::Router, ctx: &Ctx) -> i64 {
        let (status, json) = send(
            app,
            "POST",
            &sessions_uri(ctx),
            Some(&Ctx::token(&ctx.teacher)),
            Some(json!({ "center": nyc(), "radius_meters": 100.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn teacher_starts_session_and_second_start_conflicts() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let token = Ctx::token(&ctx.teacher);

        let (status, json) = send(
            &app,
            "POST",
            &sessions_uri(&ctx),
            Some(&token),
            Some(json!({ "center": nyc(), "radius_meters": 100.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["active"], true);
        assert_eq!(json["data"]["radius_meters"], 100.0);

        let course = course::Entity::find_by_id(ctx.course.id)
            .one(state.db())
            .await
            .unwrap()
            .unwrap();
        assert!(course.active_class);

        let (status, json) = send(
            &app,
            "POST",
            &sessions_uri(&ctx),
            Some(&token),
            Some(json!({ "center": nyc() })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "An active session already exists for this course");
    }

    #[tokio::test]
    #[serial]
    async fn start_session_requires_course_teacher() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let body = json!({ "center": nyc() });

        let (status, _) = send(&app, "POST", &sessions_uri(&ctx), None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let student = Ctx::token(&ctx.students[0]);
        let (status, _) = send(&app, "POST", &sessions_uri(&ctx), Some(&student), Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let other = Ctx::token(&ctx.other_teacher);
        let (status, _) = send(&app, "POST", &sessions_uri(&ctx), Some(&other), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn start_session_rejects_invalid_coordinates() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;

        let (status, json) = send(
            &app,
            "POST",
            &sessions_uri(&ctx),
            Some(&Ctx::token(&ctx.teacher)),
            Some(json!({ "center": { "latitude": 123.0, "longitude": 0.0 }, "radius_meters": -5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = json["message"].as_str().unwrap();
        assert!(message.contains("Radius"), "{message}");
    }

    #[tokio::test]
    #[serial]
    async fn student_checks_in_once() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        start_session(&app, &ctx).await;
        let token = Ctx::token(&ctx.students[0]);
        let uri = format!("{}/active", sessions_uri(&ctx));
        let near = json!({ "center": { "latitude": 40.7129, "longitude": -74.0061 } });

        let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(near.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Attendance marked successfully");

        let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(near)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "Attendance already marked");
    }

    #[tokio::test]
    #[serial]
    async fn check_in_far_away_or_without_location_is_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        start_session(&app, &ctx).await;
        let token = Ctx::token(&ctx.students[1]);
        let uri = format!("{}/active", sessions_uri(&ctx));

        let far = json!({ "center": { "latitude": 40.8, "longitude": -74.1 } });
        let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(far)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Too far from class");

        let (status, json) = send(&app, "PUT", &uri, Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Location is required to check in");
    }

    #[tokio::test]
    #[serial]
    async fn outsiders_cannot_check_in() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        start_session(&app, &ctx).await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("{}/active", sessions_uri(&ctx)),
            Some(&Ctx::token(&ctx.outsider)),
            Some(json!({ "center": nyc() })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn teacher_dismisses_running_session() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let session_id = start_session(&app, &ctx).await;
        let uri = format!("{}/active", sessions_uri(&ctx));
        let token = Ctx::token(&ctx.teacher);

        let (status, json) = send(&app, "PUT", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Session dismissed successfully");

        let session = attendance_session::Entity::find_by_id(session_id)
            .one(state.db())
            .await
            .unwrap()
            .unwrap();
        assert!(!session.active);

        let (status, json) = send(&app, "PUT", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "No active session to dismiss");

        let student = Ctx::token(&ctx.students[0]);
        let (status, json) = send(&app, "PUT", &uri, Some(&student), Some(json!({ "center": nyc() }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "No running session for this course");
    }

    #[tokio::test]
    #[serial]
    async fn admins_can_neither_dismiss_nor_check_in() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        start_session(&app, &ctx).await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("{}/active", sessions_uri(&ctx)),
            Some(&Ctx::token(&ctx.admin)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn students_only_list_sessions_they_attended() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let teacher = Ctx::token(&ctx.teacher);
        let active_uri = format!("{}/active", sessions_uri(&ctx));

        let first = start_session(&app, &ctx).await;
        send(
            &app,
            "PUT",
            &active_uri,
            Some(&Ctx::token(&ctx.students[0])),
            Some(json!({ "center": nyc() })),
        )
        .await;
        send(&app, "PUT", &active_uri, Some(&teacher), None).await;
        let second = start_session(&app, &ctx).await;

        let (status, json) = send(&app, "GET", &sessions_uri(&ctx), Some(&teacher), None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second, first]);

        let (_, json) = send(&app, "GET", &sessions_uri(&ctx), Some(&Ctx::token(&ctx.students[0])), None).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["id"], first);
        assert_eq!(json["message"], "Available sessions found: 1");

        let (_, json) = send(&app, "GET", &sessions_uri(&ctx), Some(&Ctx::token(&ctx.students[1])), None).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn teacher_corrects_roster_in_bulk() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let session_id = start_session(&app, &ctx).await;
        let token = Ctx::token(&ctx.teacher);
        let uri = format!("{}/{}", sessions_uri(&ctx), session_id);

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "marks": [
                { "student_id": ctx.students[0].id, "present": true },
                { "student_id": ctx.students[2].id, "present": true }
            ] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "marks": [ { "student_id": ctx.students[2].id, "present": false } ] })),
        )
        .await;

        let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let roster: Vec<(String, bool)> = json["data"]["students"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                (
                    s["registration_no"].as_str().unwrap().to_string(),
                    s["present"].as_bool().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            roster,
            vec![
                ("9".to_string(), false),
                ("10".to_string(), true),
                ("100".to_string(), false),
            ]
        );
        assert_eq!(json["message"], "1 student(s) present");
    }

    #[tokio::test]
    #[serial]
    async fn bulk_marking_outsider_is_bad_request() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let session_id = start_session(&app, &ctx).await;
        let uri = format!("{}/{}", sessions_uri(&ctx), session_id);

        let (status, json) = send(
            &app,
            "PUT",
            &uri,
            Some(&Ctx::token(&ctx.teacher)),
            Some(json!({ "marks": [ { "student_id": ctx.outsider.id, "present": true } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn session_routes_are_scoped_to_their_course() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let session_id = start_session(&app, &ctx).await;

        let other_course = course::Entity::find()
            .filter(course::Column::TeacherId.eq(ctx.other_teacher.id))
            .one(state.db())
            .await
            .unwrap()
            .unwrap();
        let uri = format!("/api/courses/{}/sessions/{}", other_course.id, session_id);

        let (status, json) = send(&app, "DELETE", &uri, Some(&Ctx::token(&ctx.other_teacher)), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Session not found");
    }

    #[tokio::test]
    #[serial]
    async fn deleting_running_session_clears_course_flag() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let session_id = start_session(&app, &ctx).await;
        let token = Ctx::token(&ctx.teacher);
        let uri = format!("{}/{}", sessions_uri(&ctx), session_id);

        let (status, json) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Session deleted successfully");

        let course = course::Entity::find_by_id(ctx.course.id)
            .one(state.db())
            .await
            .unwrap()
            .unwrap();
        assert!(!course.active_class);

        let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
