//! Delayed, deduplicated auto-close of attendance sessions.
//!
//! A pending close is a row in `scheduled_close_tasks` keyed by course id, so
//! arming a second close for the same course is a no-op and the earlier fire
//! time stands. A background worker polls for due rows and runs the same close
//! path as [`SessionScheduler::on_fire`]. A row is removed in the same
//! transaction that closes the session, so a crash between the two redelivers
//! the task instead of losing it.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use db::models::scheduled_close_task::{ActiveModel, Column, Entity, Model};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::task::JoinHandle;

use crate::attendance_session::SessionStore;
use crate::error::AppError;

pub use db::models::scheduled_close_task::Model as ScheduledCloseTask;

pub const DEFAULT_TTL_SECONDS: i64 = 300;

#[derive(Clone)]
pub struct SessionScheduler {
    db: DatabaseConnection,
    ttl: TimeDelta,
}

impl SessionScheduler {
    pub fn new(db: DatabaseConnection, ttl: TimeDelta) -> Self {
        Self { db, ttl }
    }

    /// Scheduler using `SESSION_TTL_SECONDS`.
    pub fn from_config(db: DatabaseConnection) -> Self {
        let secs = i64::try_from(util::config::session_ttl_seconds()).unwrap_or(DEFAULT_TTL_SECONDS);
        let ttl = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::seconds(DEFAULT_TTL_SECONDS));
        Self::new(db, ttl)
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Arms an auto-close for `course_id` firing one TTL from now.
    pub async fn schedule(&self, course_id: i64) -> Result<bool, AppError> {
        self.schedule_from(course_id, Utc::now()).await
    }

    /// Arms an auto-close firing one TTL after `from`.
    ///
    /// Returns `false` when a task was already pending for the course; that
    /// task is left as it was.
    pub async fn schedule_from(&self, course_id: i64, from: DateTime<Utc>) -> Result<bool, AppError> {
        let task = ActiveModel {
            course_id: Set(course_id),
            fire_at: Set(from + self.ttl),
            created_at: Set(Utc::now()),
        };

        let inserted = Entity::insert(task)
            .on_conflict(OnConflict::column(Column::CourseId).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;

        if inserted > 0 {
            tracing::debug!(course_id, fire_at = %(from + self.ttl), "Auto-close scheduled");
        }
        Ok(inserted > 0)
    }

    pub async fn pending(&self, course_id: i64) -> Result<Option<Model>, AppError> {
        Ok(Entity::find_by_id(course_id).one(&self.db).await?)
    }

    /// Delivers the auto-close for `course_id`.
    ///
    /// Closes the active session if there is one and acknowledges the pending
    /// task atomically. Safe to call any number of times: with nothing active
    /// it only clears the task. Returns whether a session was closed.
    pub async fn on_fire(&self, store: &SessionStore, course_id: i64) -> Result<bool, AppError> {
        self.deliver(store, course_id, None).await
    }

    /// Closes and acknowledges in one transaction. With `fire_at` set only the
    /// task armed for that instant is acknowledged, so a stale delivery never
    /// clears a newer schedule.
    async fn deliver(
        &self,
        store: &SessionStore,
        course_id: i64,
        fire_at: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let txn = self.db.begin().await?;
        let closed = store.close_if_active_on(&txn, course_id).await?;

        let mut ack = Entity::delete_many().filter(Column::CourseId.eq(course_id));
        if let Some(fire_at) = fire_at {
            ack = ack.filter(Column::FireAt.eq(fire_at));
        }
        ack.exec(&txn).await?;
        txn.commit().await?;

        if closed {
            store.after_close(course_id).await;
        } else {
            tracing::debug!(course_id, "Auto-close fired with no active session");
        }
        Ok(closed)
    }

    /// Delivers every task due at `now`, oldest first. A task whose delivery
    /// fails stays pending for the next pass.
    ///
    /// Returns the number of tasks delivered.
    pub async fn fire_due(&self, store: &SessionStore, now: DateTime<Utc>) -> Result<usize, AppError> {
        let due = Entity::find()
            .filter(Column::FireAt.lte(now))
            .order_by_asc(Column::FireAt)
            .all(&self.db)
            .await?;

        let mut delivered = 0;
        for task in due {
            match self.deliver(store, task.course_id, Some(task.fire_at)).await {
                Ok(_) => delivered += 1,
                Err(err) => tracing::error!(
                    course_id = task.course_id,
                    error = %err,
                    "Auto-close delivery failed; will retry"
                ),
            }
        }
        Ok(delivered)
    }
}

/// Starts the background worker delivering due auto-close tasks every
/// `interval`.
pub fn spawn_close_worker(store: SessionStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_ms = interval.as_millis() as u64, "Auto-close worker started");

        loop {
            ticker.tick().await;
            if let Err(err) = store.scheduler().fire_due(&store, Utc::now()).await {
                tracing::error!(error = %err, "Failed to poll due auto-close tasks");
            }
        }
    })
}
