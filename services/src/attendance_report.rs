//! Cross-session attendance reporting.
//!
//! Reads session history only; nothing here writes to sessions or marks.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::models::{attendance_mark, attendance_session, course};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::json;

use crate::attendance_session::AttendanceSession;
use crate::course_registry::{CourseRegistry, DbCourseRegistry, RosterEntry};
use crate::error::AppError;
use crate::notification::{NotificationJob, NotificationSink};

pub const ATTENDANCE_TEMPLATE: &str = "course-attendance";

/// Header for one session column of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportColumn {
    pub session_id: i64,
    pub created_at: DateTime<Utc>,
    /// `dd/mm/YYYY`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub student_id: i64,
    pub registration_no: String,
    pub name: String,
    /// One entry per column, in column order.
    pub presence: Vec<bool>,
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub course_id: i64,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPresence {
    pub student_id: i64,
    pub registration_no: String,
    pub name: String,
    pub present: bool,
}

/// A single session with every enrolled student and whether they were marked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRoster {
    pub session: AttendanceSession,
    pub students: Vec<StudentPresence>,
}

/// `present / total` as a percentage rounded to two decimals; `0` when there
/// were no sessions.
pub fn attendance_percentage(present: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = present as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Orders registration numbers by numeric value. Numbers that do not parse
/// sort after all numeric ones, lexically.
pub fn compare_registration_no(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn sort_roster(roster: &mut [RosterEntry]) {
    roster.sort_by(|a, b| {
        compare_registration_no(&a.registration_no, &b.registration_no)
            .then(a.student_id.cmp(&b.student_id))
    });
}

#[derive(Clone)]
pub struct AttendanceReportAggregator {
    db: DatabaseConnection,
    registry: Arc<dyn CourseRegistry>,
}

impl AttendanceReportAggregator {
    pub fn new(db: DatabaseConnection, registry: Arc<dyn CourseRegistry>) -> Self {
        Self { db, registry }
    }

    pub fn from_db(db: DatabaseConnection) -> Self {
        let registry = Arc::new(DbCourseRegistry::new(db.clone()));
        Self::new(db, registry)
    }

    /// Presence of every enrolled student across every session of the course,
    /// columns oldest first and rows by numeric registration number.
    pub async fn build_report(&self, course_id: i64) -> Result<AttendanceReport, AppError> {
        let sessions = attendance_session::Entity::find()
            .filter(attendance_session::Column::CourseId.eq(course_id))
            .order_by_asc(attendance_session::Column::CreatedAt)
            .order_by_asc(attendance_session::Column::Id)
            .all(&self.db)
            .await?;

        if sessions.is_empty() {
            return Err(AppError::not_found("No sessions found for this course"));
        }

        let mut roster = self.registry.get_roster(course_id).await?;
        sort_roster(&mut roster);

        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let marks: HashSet<(i64, i64)> = attendance_mark::Entity::find()
            .filter(attendance_mark::Column::SessionId.is_in(session_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.session_id, m.student_id))
            .collect();

        let rows = roster
            .into_iter()
            .map(|student| {
                let presence: Vec<bool> = sessions
                    .iter()
                    .map(|s| marks.contains(&(s.id, student.student_id)))
                    .collect();
                let present = presence.iter().filter(|p| **p).count();
                ReportRow {
                    student_id: student.student_id,
                    registration_no: student.registration_no,
                    name: student.name,
                    attendance_percentage: attendance_percentage(present, presence.len()),
                    presence,
                }
            })
            .collect();

        let columns = sessions
            .iter()
            .map(|s| ReportColumn {
                session_id: s.id,
                created_at: s.created_at,
                label: s.created_at.format("%d/%m/%Y").to_string(),
            })
            .collect();

        Ok(AttendanceReport {
            course_id,
            columns,
            rows,
        })
    }

    /// Every enrolled student of the session's course with their mark.
    pub async fn session_roster(&self, session_id: i64) -> Result<SessionRoster, AppError> {
        let session = attendance_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))?;

        let marked: HashSet<i64> = attendance_mark::Entity::find()
            .filter(attendance_mark::Column::SessionId.eq(session_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.student_id)
            .collect();

        let mut roster = self.registry.get_roster(session.course_id).await?;
        sort_roster(&mut roster);

        let students = roster
            .into_iter()
            .map(|s| StudentPresence {
                present: marked.contains(&s.student_id),
                student_id: s.student_id,
                registration_no: s.registration_no,
                name: s.name,
            })
            .collect();

        Ok(SessionRoster { session, students })
    }

    /// Builds the report and queues it for e-mail delivery to the course
    /// teacher.
    pub async fn send_report(
        &self,
        course_id: i64,
        sink: &dyn NotificationSink,
    ) -> Result<String, AppError> {
        let (course, teacher) = course::Model::find_with_teacher(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;
        let teacher = teacher.ok_or_else(|| AppError::not_found("Course teacher not found"))?;

        let report = self.build_report(course_id).await?;

        sink.enqueue(NotificationJob {
            kind: ATTENDANCE_TEMPLATE.to_string(),
            recipient: teacher.email,
            subject: format!("Course Attendance for {}", course.name),
            payload: json!({
                "COURSE": course.name,
                "columns": report.columns,
                "rows": report.rows,
            }),
        })
        .await?;

        tracing::info!(course_id, rows = report.rows.len(), "Attendance report queued");
        Ok("Attendance report queued for delivery".to_string())
    }
}
