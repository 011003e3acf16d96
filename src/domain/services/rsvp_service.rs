use std::sync::Arc;
use std::time::Duration as StdDuration;
use chrono::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use crate::config::RsvpSettings;
use crate::domain::models::{
    event::EventLedger,
    notification::NotificationPayload,
    rsvp::{Rsvp, RsvpMetadata, RsvpOp, RsvpStatus},
};
use crate::domain::ports::{EventRepository, NotificationEmitter, RsvpRepository};
use crate::domain::services::{
    clock::Clock,
    cooldown::CooldownPolicy,
    notifications,
    retry::RetryPolicy,
    rsvp_machine::{self, TransitionContext},
    rsvp_queries::{order_by_recency, StatusSummary},
};
use crate::error::AppError;

/// Entry points used by the HTTP layer. Every state change goes through
/// [`rsvp_machine::transition`] inside a single store transaction.
pub struct RsvpService {
    rsvp_repo: Arc<dyn RsvpRepository>,
    event_repo: Arc<dyn EventRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    clock: Arc<dyn Clock>,
    cooldown: CooldownPolicy,
    retry: RetryPolicy,
}

impl RsvpService {
    pub fn new(
        rsvp_repo: Arc<dyn RsvpRepository>,
        event_repo: Arc<dyn EventRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
        settings: &RsvpSettings,
    ) -> Self {
        Self {
            rsvp_repo,
            event_repo,
            notifier,
            clock,
            cooldown: CooldownPolicy::new(Duration::seconds(settings.cooldown_secs)),
            retry: RetryPolicy::new(settings.max_tx_attempts, StdDuration::from_millis(settings.retry_base_ms)),
        }
    }

    /// Creates a pending RSVP, or reactivates a cancelled/rejected one for the same pair.
    /// Capacity is not checked here; pending requests may oversubscribe an event.
    pub async fn submit(&self, event_id: &str, user_id: &str, metadata: RsvpMetadata) -> Result<Rsvp, AppError> {
        let event = self.event_repo.find_by_id(event_id).await?
            .ok_or_else(|| AppError::EventNotFound(event_id.to_string()))?;

        if !event.status.accepts_rsvps() {
            return Err(AppError::EventUnavailable { event_id: event.id, status: event.status });
        }

        if let Some(existing) = self.rsvp_repo.find_by_event_and_user(event_id, user_id).await? {
            if !existing.status.is_reusable() {
                return Err(duplicate(&existing));
            }

            info!("submit: reactivating {} RSVP {} for user {}", existing.status, existing.id, user_id);
            return match self.execute(&existing.id, user_id, RsvpOp::Reapply, Some(&metadata)).await {
                // Lost a race with another submit that already reactivated the record.
                Err(AppError::InvalidStateTransition { .. }) => {
                    let current = self.rsvp_repo.find_by_id(&existing.id).await?.unwrap_or(existing);
                    Err(duplicate(&current))
                }
                other => other,
            };
        }

        let rsvp = Rsvp::new(event.id.clone(), user_id.to_string(), metadata, self.clock.now());
        let created = match self.rsvp_repo.create(&rsvp).await {
            Ok(created) => created,
            Err(e) if e.is_unique_violation() => {
                let winner = self.rsvp_repo.find_by_event_and_user(event_id, user_id).await?;
                return Err(AppError::DuplicateRsvp {
                    rsvp_id: winner.map(|r| r.id).unwrap_or_default(),
                    event_id: event_id.to_string(),
                    user_id: user_id.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        info!("RSVP {} submitted by {} for event {}", created.id, user_id, event_id);
        self.dispatch(notifications::for_submission(&created, &event)).await;
        Ok(created)
    }

    pub async fn transition(&self, rsvp_id: &str, actor_id: &str, op: RsvpOp) -> Result<Rsvp, AppError> {
        self.execute(rsvp_id, actor_id, op, None).await
    }

    pub async fn reapply(&self, rsvp_id: &str, actor_id: &str, metadata: Option<RsvpMetadata>) -> Result<Rsvp, AppError> {
        self.execute(rsvp_id, actor_id, RsvpOp::Reapply, metadata.as_ref()).await
    }

    pub async fn get(&self, rsvp_id: &str) -> Result<Rsvp, AppError> {
        self.rsvp_repo.find_by_id(rsvp_id).await?
            .ok_or_else(|| AppError::RsvpNotFound(rsvp_id.to_string()))
    }

    pub async fn get_by_event(&self, event_id: &str, status: Option<RsvpStatus>) -> Result<Vec<Rsvp>, AppError> {
        self.require_event(event_id).await?;
        self.rsvp_repo.list_by_event(event_id, status).await
    }

    pub async fn get_by_user(&self, user_id: &str) -> Result<Vec<Rsvp>, AppError> {
        let mut rsvps = self.rsvp_repo.list_by_user(user_id).await?;
        order_by_recency(&mut rsvps);
        Ok(rsvps)
    }

    pub async fn find_one(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError> {
        self.rsvp_repo.find_by_event_and_user(event_id, user_id).await
    }

    pub async fn summary(&self, event_id: &str) -> Result<StatusSummary, AppError> {
        let rsvps = self.get_by_event(event_id, None).await?;
        Ok(StatusSummary::from_rsvps(&rsvps))
    }

    async fn require_event(&self, event_id: &str) -> Result<EventLedger, AppError> {
        self.event_repo.find_ledger(event_id).await?
            .ok_or_else(|| AppError::EventNotFound(event_id.to_string()))
    }

    async fn execute(
        &self,
        rsvp_id: &str,
        actor_id: &str,
        op: RsvpOp,
        metadata: Option<&RsvpMetadata>,
    ) -> Result<Rsvp, AppError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let now = self.clock.now();
            let cooldown = &self.cooldown;
            let planner = move |rsvp: &Rsvp, ledger: &EventLedger| {
                let ctx = TransitionContext { actor_id, now, cooldown, metadata };
                rsvp_machine::transition(rsvp, ledger, op, &ctx)
            };

            match self.rsvp_repo.apply_transition(rsvp_id, &planner).await {
                Ok((rsvp, transition)) => {
                    info!(
                        rsvp_id = %rsvp.id,
                        event_id = %rsvp.event_id,
                        op = %op,
                        from = %transition.from,
                        to = %transition.to,
                        attempt,
                        "RSVP transition committed"
                    );
                    self.dispatch(transition.into_notifications()).await;
                    return Ok(rsvp);
                }
                Err(AppError::WriteConflict) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!("{} on RSVP {} hit a write conflict (attempt {}), retrying in {:?}", op, rsvp_id, attempt, delay);
                    sleep(delay).await;
                }
                Err(AppError::WriteConflict) => {
                    warn!("{} on RSVP {} gave up after {} conflicting attempts", op, rsvp_id, attempt);
                    return Err(AppError::ConcurrencyConflict { rsvp_id: rsvp_id.to_string(), op, attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Best effort: the committed state change is the source of truth.
    async fn dispatch(&self, batch: Vec<NotificationPayload>) {
        for notification in batch {
            if let Err(e) = self.notifier.emit(&notification).await {
                error!(
                    user_id = %notification.user_id,
                    kind = notification.kind.as_str(),
                    event_id = %notification.related_event_id,
                    "Failed to emit notification: {}", e
                );
            }
        }
    }
}

fn duplicate(existing: &Rsvp) -> AppError {
    AppError::DuplicateRsvp {
        rsvp_id: existing.id.clone(),
        event_id: existing.event_id.clone(),
        user_id: existing.user_id.clone(),
    }
}
