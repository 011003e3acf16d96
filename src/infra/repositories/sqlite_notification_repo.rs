use crate::domain::{
    models::notification::{NotificationPayload, NotificationRecord},
    ports::NotificationEmitter,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationEmitter for SqliteNotificationRepo {
    async fn emit(&self, notification: &NotificationPayload) -> Result<(), AppError> {
        let record = NotificationRecord::from_payload(notification);
        sqlx::query("INSERT INTO notifications (id, user_id, notification_type, message, related_event_id, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(&record.id).bind(&record.user_id).bind(&record.notification_type)
            .bind(&record.message).bind(&record.related_event_id).bind(record.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
