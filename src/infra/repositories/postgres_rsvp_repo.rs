use crate::domain::{
    models::{event::{Event, EventLedger}, rsvp::{Rsvp, RsvpStatus}},
    ports::{RsvpRepository, TransitionPlanner},
    services::rsvp_machine::{SeatChange, Transition},
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresRsvpRepo {
    pool: PgPool,
}

impl PostgresRsvpRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 40001 = serialization_failure, 40P01 = deadlock_detected, 55P03 = lock_not_available
fn tx_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error()
        && let Some(code) = db_err.code()
        && matches!(code.as_ref(), "40001" | "40P01" | "55P03") {
        return AppError::WriteConflict;
    }
    AppError::Database(e)
}

#[async_trait]
impl RsvpRepository for PostgresRsvpRepo {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>(
            r#"INSERT INTO rsvps (id, event_id, user_id, status, metadata, created_at, updated_at, last_cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *"#
        )
            .bind(&rsvp.id)
            .bind(&rsvp.event_id)
            .bind(&rsvp.user_id)
            .bind(rsvp.status.as_str())
            .bind(&rsvp.metadata)
            .bind(rsvp.created_at)
            .bind(rsvp.updated_at)
            .bind(rsvp.last_cancelled_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_event_and_user(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str, status: Option<RsvpStatus>) -> Result<Vec<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>(
            "SELECT * FROM rsvps WHERE event_id = $1 AND ($2::TEXT IS NULL OR status = $2) ORDER BY created_at ASC",
        )
            .bind(event_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn apply_transition(&self, rsvp_id: &str, planner: &TransitionPlanner<'_>) -> Result<(Rsvp, Transition), AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        // Row locks are taken rsvp first, then event, on every path.
        let current = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = $1 FOR UPDATE")
            .bind(rsvp_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(tx_error)?
            .ok_or_else(|| AppError::RsvpNotFound(rsvp_id.to_string()))?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
            .bind(&current.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(tx_error)?
            .ok_or_else(|| AppError::EventNotFound(current.event_id.clone()))?;

        let participants: Vec<String> = sqlx::query_scalar("SELECT user_id FROM event_participants WHERE event_id = $1")
            .bind(&event.id)
            .fetch_all(&mut *tx)
            .await
            .map_err(tx_error)?;

        let ledger = EventLedger::new(event, participants);
        let transition = planner(&current, &ledger)?;
        let next = transition.apply_to(&current);

        let updated = sqlx::query_as::<_, Rsvp>(
            r#"UPDATE rsvps SET status = $1, metadata = $2, updated_at = $3, last_cancelled_at = $4
            WHERE id = $5 AND status = $6
            RETURNING *"#
        )
            .bind(next.status.as_str())
            .bind(&next.metadata)
            .bind(next.updated_at)
            .bind(next.last_cancelled_at)
            .bind(&next.id)
            .bind(current.status.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(tx_error)?
            .ok_or(AppError::WriteConflict)?;

        if let Some(change) = transition.seat_change() {
            match change {
                SeatChange::Reserve { user_id } => {
                    sqlx::query("INSERT INTO event_participants (event_id, user_id, joined_at) VALUES ($1, $2, $3) ON CONFLICT (event_id, user_id) DO NOTHING")
                        .bind(&ledger.event.id)
                        .bind(user_id)
                        .bind(transition.at)
                        .execute(&mut *tx)
                        .await
                        .map_err(tx_error)?;
                }
                SeatChange::Release { user_id } => {
                    sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND user_id = $2")
                        .bind(&ledger.event.id)
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(tx_error)?;
                }
            }

            let bumped = sqlx::query("UPDATE events SET version = version + 1, updated_at = $1 WHERE id = $2 AND version = $3")
                .bind(transition.at)
                .bind(&ledger.event.id)
                .bind(ledger.event.version)
                .execute(&mut *tx)
                .await
                .map_err(tx_error)?;
            if bumped.rows_affected() == 0 {
                return Err(AppError::WriteConflict);
            }
        }

        tx.commit().await.map_err(tx_error)?;
        Ok((updated, transition))
    }
}
