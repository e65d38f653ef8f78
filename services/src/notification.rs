use async_trait::async_trait;
use chrono::Utc;
use db::models::notification_job;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// An e-mail job handed off for eventual delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationJob {
    /// Template name.
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub payload: Value,
}

/// Accepts jobs for asynchronous delivery. Implementations must not wait for
/// the message to be sent.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn enqueue(&self, job: NotificationJob) -> Result<(), AppError>;
}

/// Writes jobs to the `notification_jobs` outbox table.
#[derive(Clone)]
pub struct DbNotificationSink {
    db: DatabaseConnection,
}

impl DbNotificationSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSink for DbNotificationSink {
    async fn enqueue(&self, job: NotificationJob) -> Result<(), AppError> {
        let row = notification_job::ActiveModel {
            kind: Set(job.kind),
            recipient: Set(job.recipient),
            subject: Set(job.subject),
            payload: Set(job.payload.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(job_id = row.id, kind = %row.kind, "Notification job queued");
        Ok(())
    }
}
