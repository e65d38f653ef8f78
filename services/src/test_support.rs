use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use db::models::{course, course_student, user};
use sea_orm::DatabaseConnection;

use crate::course_registry::{CourseRegistry, RosterEntry};
use crate::error::AppError;
use crate::notification::{NotificationJob, NotificationSink};

static NEXT_FIXTURE: AtomicUsize = AtomicUsize::new(1);

pub struct Fixture {
    pub teacher: user::Model,
    pub course: course::Model,
    pub students: Vec<user::Model>,
}

/// Seeds a teacher, one course and one enrolled student per registration
/// number, in the given order.
pub async fn seed_course(db: &DatabaseConnection, registration_nos: &[&str]) -> Fixture {
    let n = NEXT_FIXTURE.fetch_add(1, Ordering::Relaxed);

    let teacher = user::Model::create(
        db,
        &format!("Teacher {n}"),
        &format!("teacher{n}@example.com"),
        None,
        user::Role::Teacher,
    )
    .await
    .unwrap();

    let course = course::Model::create(db, &format!("Course {n}"), &format!("C{n:03}"), teacher.id)
        .await
        .unwrap();

    let mut students = Vec::with_capacity(registration_nos.len());
    for reg in registration_nos {
        let student = user::Model::create(
            db,
            &format!("Student {reg}"),
            &format!("student{n}_{reg}@example.com"),
            Some(reg),
            user::Role::Student,
        )
        .await
        .unwrap();
        course_student::Model::enroll(db, course.id, student.id)
            .await
            .unwrap();
        students.push(student);
    }

    Fixture {
        teacher,
        course,
        students,
    }
}

/// Registry whose every call fails.
pub struct FailingRegistry;

#[async_trait]
impl CourseRegistry for FailingRegistry {
    async fn set_active_flag(&self, _: i64, _: bool, _: Option<f64>) -> Result<(), AppError> {
        Err(AppError::not_found("registry unavailable"))
    }

    async fn get_roster(&self, _: i64) -> Result<Vec<RosterEntry>, AppError> {
        Err(AppError::not_found("registry unavailable"))
    }
}

/// Sink that keeps jobs in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub jobs: Mutex<Vec<NotificationJob>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn enqueue(&self, job: NotificationJob) -> Result<(), AppError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}
