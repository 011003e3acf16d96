use crate::domain::models::{
    event::{Event, EventLedger, EventStatus},
    notification::NotificationPayload,
    rsvp::{Rsvp, RsvpStatus},
};
use crate::domain::services::rsvp_machine::Transition;
use crate::error::AppError;
use async_trait::async_trait;

/// Decides a transition from the RSVP and ledger as read inside the store's transaction.
pub type TransitionPlanner<'a> = dyn Fn(&Rsvp, &EventLedger) -> Result<Transition, AppError> + Send + Sync + 'a;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn find_ledger(&self, id: &str) -> Result<Option<EventLedger>, AppError>;
    async fn update_status(&self, id: &str, status: EventStatus) -> Result<Event, AppError>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn find_by_event_and_user(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn list_by_event(&self, event_id: &str, status: Option<RsvpStatus>) -> Result<Vec<Rsvp>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Rsvp>, AppError>;

    /// Runs one transition as a single atomic unit: re-reads the RSVP and its event
    /// ledger, asks `planner` for the transition, then writes the RSVP and any seat
    /// change together. Returns `AppError::WriteConflict` when a concurrent writer won.
    async fn apply_transition(&self, rsvp_id: &str, planner: &TransitionPlanner<'_>) -> Result<(Rsvp, Transition), AppError>;
}

#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, notification: &NotificationPayload) -> Result<(), AppError>;
}
