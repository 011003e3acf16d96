use crate::domain::{models::event::{Event, EventLedger, EventStatus}, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, title, description, status, max_participants, creator_id, organizers, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.status.as_str())
            .bind(event.max_participants)
            .bind(&event.creator_id)
            .bind(&event.organizers)
            .bind(event.version)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_ledger(&self, id: &str) -> Result<Option<EventLedger>, AppError> {
        let Some(event) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let participants: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM event_participants WHERE event_id = $1 ORDER BY joined_at ASC",
        )
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(Some(EventLedger::new(event, participants)))
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>("UPDATE events SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))
    }
}
