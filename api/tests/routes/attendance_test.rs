#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::models::notification_job;
    use sea_orm::EntityTrait;
    use serde_json::{Value, json};
    use serial_test::serial;

    use crate::helpers::{Ctx, make_test_app, seed, send};

    /// Runs one dismissed session per entry, marking the given students.
    async fn run_sessions(app: &axum::Router, ctx: &Ctx, present: &[Vec<i64>]) {
        let token = Ctx::token(&ctx.teacher);
        let base = format!("/api/courses/{}/sessions", ctx.course.id);

        for students in present {
            let (status, json) = send(
                app,
                "POST",
                &base,
                Some(&token),
                Some(json!({ "center": { "latitude": 0.0, "longitude": 0.0 } })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{json}");
            let session_id = json["data"]["id"].as_i64().unwrap();

            let marks: Vec<Value> = students
                .iter()
                .map(|id| json!({ "student_id": id, "present": true }))
                .collect();
            let (status, _) = send(
                app,
                "PUT",
                &format!("{base}/{session_id}"),
                Some(&token),
                Some(json!({ "marks": marks })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);

            send(app, "PUT", &format!("{base}/active"), Some(&token), None).await;
        }
    }

    #[tokio::test]
    #[serial]
    async fn report_lists_students_by_registration_number() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        let (x, y) = (ctx.students[0].id, ctx.students[1].id);
        run_sessions(&app, &ctx, &[vec![x, y], vec![x]]).await;

        let (status, json) = send(
            &app,
            "GET",
            &format!("/api/courses/{}/attendance", ctx.course.id),
            Some(&Ctx::token(&ctx.teacher)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let data = &json["data"];
        assert_eq!(data["columns"].as_array().unwrap().len(), 2);

        let rows: Vec<(String, f64)> = data["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["registration_no"].as_str().unwrap().to_string(),
                    r["attendance_percentage"].as_f64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("9".to_string(), 50.0),
                ("10".to_string(), 100.0),
                ("100".to_string(), 0.0),
            ]
        );
        assert_eq!(data["rows"][0]["presence"], json!([true, false]));
    }

    #[tokio::test]
    #[serial]
    async fn report_without_sessions_is_not_found() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;

        let (status, json) = send(
            &app,
            "GET",
            &format!("/api/courses/{}/attendance", ctx.course.id),
            Some(&Ctx::token(&ctx.teacher)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn students_cannot_read_the_report() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/courses/{}/attendance", ctx.course.id),
            Some(&Ctx::token(&ctx.students[0])),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn sending_report_queues_email_for_teacher() {
        let (app, state) = make_test_app().await;
        let ctx = seed(state.db()).await;
        run_sessions(&app, &ctx, &[vec![ctx.students[2].id]]).await;

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/courses/{}/attendance", ctx.course.id),
            Some(&Ctx::token(&ctx.teacher)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["message"], "Attendance report queued for delivery");

        let jobs = notification_job::Entity::find().all(state.db()).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, "course-attendance");
        assert_eq!(jobs[0].recipient, ctx.teacher.email);
        assert_eq!(jobs[0].subject, "Course Attendance for Networks");

        let payload: Value = serde_json::from_str(&jobs[0].payload).unwrap();
        assert_eq!(payload["COURSE"], "Networks");
        assert_eq!(payload["rows"][2]["attendance_percentage"], 100.0);
    }
}
