use serde::Serialize;
use std::cmp::Ordering;
use crate::domain::models::rsvp::{Rsvp, RsvpStatus};

pub fn count_by_status(rsvps: &[Rsvp], status: RsvpStatus) -> usize {
    rsvps.iter().filter(|r| r.status == status).count()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        Self {
            pending: count_by_status(rsvps, RsvpStatus::Pending),
            approved: count_by_status(rsvps, RsvpStatus::Approved),
            rejected: count_by_status(rsvps, RsvpStatus::Rejected),
            cancelled: count_by_status(rsvps, RsvpStatus::Cancelled),
            total: rsvps.len(),
        }
    }
}

/// Most recently active first: latest cancellation descending (never cancelled last),
/// then creation time descending.
pub fn order_by_recency(rsvps: &mut [Rsvp]) {
    rsvps.sort_by(|a, b| {
        let by_cancel = match (a.last_cancelled_at, b.last_cancelled_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_cancel.then_with(|| b.created_at.cmp(&a.created_at))
    });
}
