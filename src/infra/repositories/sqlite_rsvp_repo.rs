use crate::domain::{
    models::{event::{Event, EventLedger}, rsvp::{Rsvp, RsvpStatus}},
    ports::{RsvpRepository, TransitionPlanner},
    services::rsvp_machine::{SeatChange, Transition},
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRsvpRepo {
    pool: SqlitePool,
}

impl SqliteRsvpRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Lock contention inside a transaction means another writer committed first.
/// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED, 261 = BUSY_RECOVERY, 517 = BUSY_SNAPSHOT
fn tx_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error()
        && let Some(code) = db_err.code()
        && matches!(code.as_ref(), "5" | "6" | "261" | "517") {
        return AppError::WriteConflict;
    }
    AppError::Database(e)
}

#[async_trait]
impl RsvpRepository for SqliteRsvpRepo {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>(
            "INSERT INTO rsvps (id, event_id, user_id, status, metadata, created_at, updated_at, last_cancelled_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&rsvp.id).bind(&rsvp.event_id).bind(&rsvp.user_id).bind(rsvp.status.as_str())
            .bind(&rsvp.metadata).bind(rsvp.created_at).bind(rsvp.updated_at).bind(rsvp.last_cancelled_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_event_and_user(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? AND user_id = ?").bind(event_id).bind(user_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str, status: Option<RsvpStatus>) -> Result<Vec<Rsvp>, AppError> {
        match status {
            Some(status) => sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? AND status = ? ORDER BY created_at ASC")
                .bind(event_id).bind(status.as_str()).fetch_all(&self.pool).await.map_err(AppError::Database),
            None => sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? ORDER BY created_at ASC")
                .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE user_id = ?").bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn apply_transition(&self, rsvp_id: &str, planner: &TransitionPlanner<'_>) -> Result<(Rsvp, Transition), AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let current = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = ?")
            .bind(rsvp_id).fetch_optional(&mut *tx).await.map_err(tx_error)?
            .ok_or_else(|| AppError::RsvpNotFound(rsvp_id.to_string()))?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(&current.event_id).fetch_optional(&mut *tx).await.map_err(tx_error)?
            .ok_or_else(|| AppError::EventNotFound(current.event_id.clone()))?;

        let participants: Vec<String> = sqlx::query_scalar("SELECT user_id FROM event_participants WHERE event_id = ?")
            .bind(&event.id).fetch_all(&mut *tx).await.map_err(tx_error)?;

        let ledger = EventLedger::new(event, participants);

        // Dropping `tx` on any early return rolls it back.
        let transition = planner(&current, &ledger)?;
        let next = transition.apply_to(&current);

        let updated = sqlx::query_as::<_, Rsvp>(
            "UPDATE rsvps SET status = ?, metadata = ?, updated_at = ?, last_cancelled_at = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(next.status.as_str()).bind(&next.metadata).bind(next.updated_at).bind(next.last_cancelled_at)
            .bind(&next.id).bind(current.status.as_str())
            .fetch_optional(&mut *tx).await.map_err(tx_error)?
            .ok_or(AppError::WriteConflict)?;

        if let Some(change) = transition.seat_change() {
            match change {
                SeatChange::Reserve { user_id } => {
                    sqlx::query("INSERT INTO event_participants (event_id, user_id, joined_at) VALUES (?, ?, ?) ON CONFLICT (event_id, user_id) DO NOTHING")
                        .bind(&ledger.event.id).bind(user_id).bind(transition.at)
                        .execute(&mut *tx).await.map_err(tx_error)?;
                }
                SeatChange::Release { user_id } => {
                    sqlx::query("DELETE FROM event_participants WHERE event_id = ? AND user_id = ?")
                        .bind(&ledger.event.id).bind(user_id)
                        .execute(&mut *tx).await.map_err(tx_error)?;
                }
            }

            let bumped = sqlx::query("UPDATE events SET version = version + 1, updated_at = ? WHERE id = ? AND version = ?")
                .bind(transition.at).bind(&ledger.event.id).bind(ledger.event.version)
                .execute(&mut *tx).await.map_err(tx_error)?;
            if bumped.rows_affected() == 0 {
                return Err(AppError::WriteConflict);
            }
        }

        tx.commit().await.map_err(tx_error)?;
        Ok((updated, transition))
    }
}
