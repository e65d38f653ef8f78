//! Session lifecycle: `none -> active -> inactive`, with at most one active
//! session per course.
//!
//! Every transition is a single conditional statement against the database;
//! nothing here takes an in-process lock. Creating relies on the partial unique
//! index over active sessions, closing is `UPDATE .. WHERE active`, and the
//! number of affected rows decides who won a race.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::models::{
    attendance_mark,
    attendance_session::{ActiveModel, Column, Entity},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::course_registry::{CourseRegistry, DbCourseRegistry};
use crate::error::{is_foreign_key_violation, is_unique_violation, AppError};
use crate::geofence::Coordinates;
use crate::principal::Principal;
use crate::scheduler::SessionScheduler;

pub use db::models::attendance_session::Model as AttendanceSession;

pub const ACTIVE_SESSION_EXISTS: &str = "An active session already exists for this course";
pub const NO_ACTIVE_SESSION: &str = "No active session to dismiss";
pub const SESSION_NOT_FOUND: &str = "Session not found";

/// Criteria for [`SessionStore::list`].
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub course_id: i64,
    /// Restrict to sessions in which this student is marked present.
    pub student_id: Option<i64>,
    pub active: Option<bool>,
}

impl SessionFilter {
    pub fn course(course_id: i64) -> Self {
        Self {
            course_id,
            ..Default::default()
        }
    }
}

/// Flips the active session of `course_id` to inactive on `conn`.
///
/// Returns `false` when there was nothing to close.
pub(crate) async fn deactivate<C>(conn: &C, course_id: i64, now: DateTime<Utc>) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let res = Entity::update_many()
        .col_expr(Column::Active, Expr::value(false))
        .col_expr(Column::ClosedAt, Expr::value(Some(now)))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::CourseId.eq(course_id))
        .filter(Column::Active.eq(true))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Owns session records and the one-active-session-per-course invariant.
#[derive(Clone)]
pub struct SessionStore {
    db: DatabaseConnection,
    registry: Arc<dyn CourseRegistry>,
    scheduler: SessionScheduler,
    default_radius_meters: f64,
}

impl SessionStore {
    pub fn new(
        db: DatabaseConnection,
        registry: Arc<dyn CourseRegistry>,
        scheduler: SessionScheduler,
    ) -> Self {
        Self {
            db,
            registry,
            scheduler,
            default_radius_meters: util::config::default_radius_meters(),
        }
    }

    /// Store wired to the database-backed registry and the configured TTL.
    pub fn from_db(db: DatabaseConnection) -> Self {
        let registry = Arc::new(DbCourseRegistry::new(db.clone()));
        let scheduler = SessionScheduler::from_config(db.clone());
        Self::new(db, registry, scheduler)
    }

    pub fn with_default_radius(mut self, radius_meters: f64) -> Self {
        self.default_radius_meters = radius_meters;
        self
    }

    pub fn scheduler(&self) -> &SessionScheduler {
        &self.scheduler
    }

    /// Opens a new session for `course_id`.
    ///
    /// Fails with `Conflict` when the course already has an active session and
    /// with `NotFound` when the course does not exist. Once the row is
    /// committed the course flag sync and the auto-close arming are
    /// best-effort: their failures are logged, never rolled back.
    pub async fn create(
        &self,
        course_id: i64,
        center: Coordinates,
        radius_meters: Option<f64>,
    ) -> Result<AttendanceSession, AppError> {
        let radius = radius_meters.unwrap_or(self.default_radius_meters);
        let now = Utc::now();

        let inserted = ActiveModel {
            course_id: Set(course_id),
            latitude: Set(center.latitude),
            longitude: Set(center.longitude),
            radius_meters: Set(radius),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let session = match inserted {
            Ok(session) => session,
            Err(err) if is_unique_violation(&err) => {
                return Err(AppError::conflict(ACTIVE_SESSION_EXISTS));
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(AppError::not_found("Course not found"));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            session_id = session.id,
            course_id,
            radius_meters = radius,
            "Attendance session started"
        );

        let (_, armed) = tokio::join!(
            self.sync_course_flag(course_id, true, radius_meters),
            self.scheduler.schedule_from(course_id, session.created_at),
        );
        match armed {
            Ok(true) => {}
            Ok(false) => tracing::debug!(course_id, "Auto-close already pending; keeping earlier fire time"),
            Err(err) => tracing::warn!(course_id, error = %err, "Failed to arm auto-close for session"),
        }

        Ok(session)
    }

    /// Closes the active session of `course_id` on behalf of a teacher.
    pub async fn dismiss(&self, course_id: i64, actor: &Principal) -> Result<String, AppError> {
        if !actor.is_teacher() {
            return Err(AppError::forbidden("Only teachers can dismiss a session"));
        }

        if !deactivate(&self.db, course_id, Utc::now()).await? {
            return Err(AppError::not_found(NO_ACTIVE_SESSION));
        }

        tracing::info!(course_id, teacher_id = actor.id, "Attendance session dismissed");
        self.sync_course_flag(course_id, false, None).await;
        Ok("Session dismissed successfully".to_string())
    }

    /// Closes the active session of `course_id`, if any.
    ///
    /// Returns whether a session was closed. Closing nothing is not an error.
    pub async fn close_if_active(&self, course_id: i64) -> Result<bool, AppError> {
        let closed = self.close_if_active_on(&self.db, course_id).await?;
        if closed {
            self.after_close(course_id).await;
        }
        Ok(closed)
    }

    /// The conditional update of [`close_if_active`](Self::close_if_active),
    /// run on the caller's connection or transaction. The course flag is left
    /// untouched; call [`after_close`](Self::after_close) once committed.
    pub(crate) async fn close_if_active_on<C>(&self, conn: &C, course_id: i64) -> Result<bool, AppError>
    where
        C: ConnectionTrait,
    {
        Ok(deactivate(conn, course_id, Utc::now()).await?)
    }

    pub(crate) async fn after_close(&self, course_id: i64) {
        tracing::info!(course_id, "Attendance session closed");
        self.sync_course_flag(course_id, false, None).await;
    }

    pub async fn find_active(&self, course_id: i64) -> Result<Option<AttendanceSession>, AppError> {
        Ok(Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::Active.eq(true))
            .one(&self.db)
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceSession>, AppError> {
        Ok(Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Sessions of a course, newest first.
    pub async fn list(&self, filter: &SessionFilter) -> Result<Vec<AttendanceSession>, AppError> {
        let mut query = Entity::find().filter(Column::CourseId.eq(filter.course_id));

        if let Some(active) = filter.active {
            query = query.filter(Column::Active.eq(active));
        }

        if let Some(student_id) = filter.student_id {
            let attended: Vec<i64> = attendance_mark::Entity::find()
                .filter(attendance_mark::Column::StudentId.eq(student_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| m.session_id)
                .collect();
            if attended.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(Column::Id.is_in(attended));
        }

        Ok(query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Deletes a session and its roster. Deleting the active session clears the
    /// course flag.
    ///
    /// Whether the row was active is decided by the delete itself: the active
    /// row is removed by a conditional statement first, so a session closed
    /// after the lookup never clears the flag of a newer one.
    pub async fn remove(&self, id: i64) -> Result<AttendanceSession, AppError> {
        let mut session = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(SESSION_NOT_FOUND))?;

        let was_active = Entity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::Active.eq(true))
            .exec(&self.db)
            .await?
            .rows_affected
            > 0;

        if !was_active && Entity::delete_by_id(id).exec(&self.db).await?.rows_affected == 0 {
            return Err(AppError::not_found(SESSION_NOT_FOUND));
        }
        session.active = was_active;

        tracing::info!(session_id = id, course_id = session.course_id, "Attendance session deleted");
        if was_active {
            self.sync_course_flag(session.course_id, false, None).await;
        }
        Ok(session)
    }

    /// Best-effort course flag update; failures are logged and swallowed.
    async fn sync_course_flag(&self, course_id: i64, active: bool, radius_meters: Option<f64>) {
        if let Err(err) = self
            .registry
            .set_active_flag(course_id, active, radius_meters)
            .await
        {
            tracing::warn!(course_id, active, error = %err, "Failed to sync course active flag");
        }
    }
}
