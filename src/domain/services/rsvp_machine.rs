use chrono::{DateTime, Utc};
use sqlx::types::Json;
use crate::domain::models::{
    event::EventLedger,
    notification::NotificationPayload,
    rsvp::{Rsvp, RsvpMetadata, RsvpOp, RsvpStatus},
};
use crate::domain::services::cooldown::{ceil_seconds, CooldownPolicy};
use crate::domain::services::notifications;
use crate::error::AppError;

pub struct TransitionContext<'a> {
    pub actor_id: &'a str,
    pub now: DateTime<Utc>,
    pub cooldown: &'a CooldownPolicy,
    /// Participant-supplied data to merge on reapply.
    pub metadata: Option<&'a RsvpMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatChange {
    Reserve { user_id: String },
    Release { user_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Seat(SeatChange),
    StampCancelled(DateTime<Utc>),
    MergeMetadata(RsvpMetadata),
    Notify(NotificationPayload),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub rsvp_id: String,
    pub event_id: String,
    pub op: RsvpOp,
    pub from: RsvpStatus,
    pub to: RsvpStatus,
    pub at: DateTime<Utc>,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// The record as it must be persisted once this transition commits.
    pub fn apply_to(&self, rsvp: &Rsvp) -> Rsvp {
        let mut next = rsvp.clone();
        next.status = self.to;
        next.updated_at = self.at;

        for effect in &self.effects {
            match effect {
                Effect::StampCancelled(at) => next.last_cancelled_at = Some(*at),
                Effect::MergeMetadata(update) => {
                    let mut merged = next.metadata.0.clone();
                    merged.merge(update.clone());
                    next.metadata = Json(merged);
                }
                Effect::Seat(_) | Effect::Notify(_) => {}
            }
        }
        next
    }

    pub fn seat_change(&self) -> Option<&SeatChange> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Seat(change) => Some(change),
            _ => None,
        })
    }

    pub fn into_notifications(self) -> Vec<NotificationPayload> {
        self.effects.into_iter()
            .filter_map(|effect| match effect {
                Effect::Notify(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }
}

/// Approve/reject belong to organizers; cancel/reapply belong to the RSVP owner.
fn authorize(rsvp: &Rsvp, ledger: &EventLedger, op: RsvpOp, actor_id: &str) -> Result<(), AppError> {
    let allowed = match op {
        RsvpOp::Approve | RsvpOp::Reject => ledger.event.is_organizer(actor_id),
        RsvpOp::Cancel | RsvpOp::Reapply => rsvp.user_id == actor_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::UnauthorizedTransition {
            rsvp_id: rsvp.id.clone(),
            actor_id: actor_id.to_string(),
            op,
        })
    }
}

/// Pure decision step: inspects an RSVP and the event ledger as read inside the
/// caller's transaction and returns the target state plus the effects to carry out.
/// Seat and record effects belong to that transaction; notifications go out after commit.
pub fn transition(
    rsvp: &Rsvp,
    ledger: &EventLedger,
    op: RsvpOp,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, AppError> {
    authorize(rsvp, ledger, op, ctx.actor_id)?;

    let to = rsvp.status.apply(op).ok_or_else(|| AppError::InvalidStateTransition {
        rsvp_id: rsvp.id.clone(),
        op,
        state: rsvp.status,
    })?;

    let mut effects = Vec::new();

    match op {
        RsvpOp::Approve => {
            // A stale seat (should not exist for a pending RSVP) is reused, not double counted.
            if !ledger.has_seat(&rsvp.user_id) {
                if let Some(max) = ledger.event.max_participants
                    && ledger.is_full() {
                    return Err(AppError::CapacityExceeded {
                        rsvp_id: rsvp.id.clone(),
                        event_id: ledger.event.id.clone(),
                        max_participants: max,
                    });
                }
                effects.push(Effect::Seat(SeatChange::Reserve { user_id: rsvp.user_id.clone() }));
            }
        }
        RsvpOp::Reject => {}
        RsvpOp::Cancel => {
            if rsvp.status.holds_seat() {
                effects.push(Effect::Seat(SeatChange::Release { user_id: rsvp.user_id.clone() }));
            }
            effects.push(Effect::StampCancelled(ctx.now));
        }
        RsvpOp::Reapply => {
            if !ledger.event.status.accepts_rsvps() {
                return Err(AppError::EventUnavailable {
                    event_id: ledger.event.id.clone(),
                    status: ledger.event.status,
                });
            }
            if rsvp.status == RsvpStatus::Cancelled
                && let Some(remaining) = ctx.cooldown.remaining(rsvp.last_cancelled_at, ctx.now) {
                return Err(AppError::CooldownActive {
                    rsvp_id: rsvp.id.clone(),
                    event_id: rsvp.event_id.clone(),
                    retry_after_secs: ceil_seconds(remaining),
                });
            }
            if let Some(update) = ctx.metadata {
                effects.push(Effect::MergeMetadata(update.clone()));
            }
        }
    }

    effects.extend(
        notifications::for_transition(op, rsvp, &ledger.event)
            .into_iter()
            .map(Effect::Notify),
    );

    Ok(Transition {
        rsvp_id: rsvp.id.clone(),
        event_id: rsvp.event_id.clone(),
        op,
        from: rsvp.status,
        to,
        at: ctx.now,
        effects,
    })
}
