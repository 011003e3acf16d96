use crate::domain::{
    models::notification::{NotificationPayload, NotificationRecord},
    ports::NotificationEmitter,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationEmitter for PostgresNotificationRepo {
    async fn emit(&self, notification: &NotificationPayload) -> Result<(), AppError> {
        let record = NotificationRecord::from_payload(notification);
        sqlx::query(
            r#"INSERT INTO notifications (id, user_id, notification_type, message, related_event_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)"#
        )
            .bind(&record.id)
            .bind(&record.user_id)
            .bind(&record.notification_type)
            .bind(&record.message)
            .bind(&record.related_event_id)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
