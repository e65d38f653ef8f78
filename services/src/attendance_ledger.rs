//! Per-session roster of present students.
//!
//! A mark is one `(session_id, student_id)` row, so the roster is a set and
//! every write is a set operation: inserts ignore existing pairs and deletes
//! ignore missing ones. Concurrent check-ins for the same student therefore
//! produce one row, and bulk corrections can be retried.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use db::models::attendance_mark::{ActiveModel, Column, Entity};
use db::models::{attendance_session, course_student};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geofence::{within_radius, Coordinates};

pub const ALREADY_MARKED: &str = "Attendance already marked";
pub const TOO_FAR: &str = "Too far from class";
pub const NO_RUNNING_SESSION: &str = "No running session for this course";

/// One teacher correction: mark `student_id` present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkUpdate {
    pub student_id: i64,
    pub present: bool,
}

/// Result of a bulk correction, for logging and responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkMarkOutcome {
    pub added: u64,
    pub removed: u64,
}

#[derive(Clone)]
pub struct AttendanceLedger {
    db: DatabaseConnection,
}

impl AttendanceLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Student-initiated check-in against the running session of `course_id`.
    pub async fn check_in(
        &self,
        course_id: i64,
        student_id: i64,
        location: Coordinates,
    ) -> Result<String, AppError> {
        let session = attendance_session::Entity::find()
            .filter(attendance_session::Column::CourseId.eq(course_id))
            .filter(attendance_session::Column::Active.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(NO_RUNNING_SESSION))?;

        if self.is_marked(session.id, student_id).await? {
            return Err(AppError::conflict(ALREADY_MARKED));
        }

        let center = Coordinates::new(session.latitude, session.longitude);
        let distance = location.distance_to(&center);
        if !within_radius(distance, session.radius_meters) {
            tracing::debug!(
                session_id = session.id,
                student_id,
                distance_m = distance,
                radius_m = session.radius_meters,
                "Check-in rejected: outside geofence"
            );
            return Err(AppError::bad_request(TOO_FAR));
        }

        let inserted = Entity::insert(mark(session.id, student_id))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        // Lost the race against a concurrent check-in for the same student.
        if inserted == 0 {
            return Err(AppError::conflict(ALREADY_MARKED));
        }

        tracing::info!(session_id = session.id, student_id, "Attendance marked");
        Ok("Attendance marked successfully".to_string())
    }

    /// Teacher correction of a session roster.
    ///
    /// Present entries are added and absent ones removed; when a student is
    /// listed more than once the last entry wins. No conflict checks are made
    /// and the session may already be closed. Only students enrolled in the
    /// session's course can be marked present.
    pub async fn bulk_mark(
        &self,
        session_id: i64,
        marks: &[MarkUpdate],
    ) -> Result<BulkMarkOutcome, AppError> {
        let session = attendance_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;

        let latest: BTreeMap<i64, bool> = marks.iter().map(|m| (m.student_id, m.present)).collect();
        let (present, absent): (Vec<_>, Vec<_>) = latest.into_iter().partition(|(_, p)| *p);
        let present: Vec<i64> = present.into_iter().map(|(student_id, _)| student_id).collect();

        let mut outcome = BulkMarkOutcome::default();

        if !present.is_empty() {
            let enrolled: BTreeSet<i64> = course_student::Entity::find()
                .filter(course_student::Column::CourseId.eq(session.course_id))
                .filter(course_student::Column::StudentId.is_in(present.clone()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|e| e.student_id)
                .collect();
            if let Some(stranger) = present.iter().find(|id| !enrolled.contains(*id)) {
                return Err(AppError::bad_request(format!(
                    "Student {stranger} is not enrolled in this course"
                )));
            }

            let rows = present.iter().map(|student_id| mark(session_id, *student_id));
            outcome.added = Entity::insert_many(rows)
                .on_conflict(
                    OnConflict::columns([Column::SessionId, Column::StudentId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await?;
        }

        if !absent.is_empty() {
            let ids: Vec<i64> = absent.into_iter().map(|(student_id, _)| student_id).collect();
            outcome.removed = Entity::delete_many()
                .filter(Column::SessionId.eq(session_id))
                .filter(Column::StudentId.is_in(ids))
                .exec(&self.db)
                .await?
                .rows_affected;
        }

        tracing::info!(
            session_id,
            added = outcome.added,
            removed = outcome.removed,
            "Attendance roster updated"
        );
        Ok(outcome)
    }

    /// Student ids marked present in `session_id`, ascending.
    pub async fn roster(&self, session_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.student_id)
            .collect())
    }

    pub async fn is_marked(&self, session_id: i64, student_id: i64) -> Result<bool, AppError> {
        Ok(Entity::find_by_id((session_id, student_id))
            .one(&self.db)
            .await?
            .is_some())
    }
}

fn mark(session_id: i64, student_id: i64) -> ActiveModel {
    ActiveModel {
        session_id: Set(session_id),
        student_id: Set(student_id),
        marked_at: Set(Utc::now()),
    }
}
