//! The narrow view of courses that the attendance core needs.
//!
//! Sessions never load the course aggregate; they flip its `active_class` flag
//! and read its roster through [`CourseRegistry`], which keeps the course and
//! session modules free of each other.

use async_trait::async_trait;
use chrono::Utc;
use db::models::{course, course_student, user};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::error::AppError;

/// A student enrolled in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub registration_no: String,
    pub name: String,
}

#[async_trait]
pub trait CourseRegistry: Send + Sync {
    /// Mirrors whether the course has an active session. When `radius_meters`
    /// is given it also becomes the course default.
    async fn set_active_flag(
        &self,
        course_id: i64,
        active: bool,
        radius_meters: Option<f64>,
    ) -> Result<(), AppError>;

    /// Students enrolled in the course, in no particular order.
    async fn get_roster(&self, course_id: i64) -> Result<Vec<RosterEntry>, AppError>;
}

/// [`CourseRegistry`] backed by the `courses` and `course_students` tables.
#[derive(Clone)]
pub struct DbCourseRegistry {
    db: DatabaseConnection,
}

impl DbCourseRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseRegistry for DbCourseRegistry {
    async fn set_active_flag(
        &self,
        course_id: i64,
        active: bool,
        radius_meters: Option<f64>,
    ) -> Result<(), AppError> {
        let mut update = course::Entity::update_many()
            .col_expr(course::Column::ActiveClass, Expr::value(active))
            .col_expr(course::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(radius) = radius_meters {
            update = update.col_expr(course::Column::RadiusMeters, Expr::value(radius));
        }

        let res = update
            .filter(course::Column::Id.eq(course_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::not_found("Course not found"));
        }
        Ok(())
    }

    async fn get_roster(&self, course_id: i64) -> Result<Vec<RosterEntry>, AppError> {
        let students = user::Entity::find()
            .inner_join(course_student::Entity)
            .filter(course_student::Column::CourseId.eq(course_id))
            .all(&self.db)
            .await?;

        Ok(students
            .into_iter()
            .map(|u| RosterEntry {
                student_id: u.id,
                registration_no: u.registration_no.unwrap_or_default(),
                name: u.name,
            })
            .collect())
    }
}
