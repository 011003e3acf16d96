use crate::domain::models::event::{Event, EventLedger};
use serde::Serialize;

#[derive(Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub participants: Vec<String>,
    pub occupancy: usize,
    /// `None` when the event has no capacity limit.
    pub seats_left: Option<usize>,
}

impl From<EventLedger> for EventResponse {
    fn from(ledger: EventLedger) -> Self {
        let occupancy = ledger.occupancy();
        let seats_left = ledger.event.max_participants
            .map(|max| (max.max(0) as usize).saturating_sub(occupancy));
        Self {
            participants: ledger.participants.into_iter().collect(),
            occupancy,
            seats_left,
            event: ledger.event,
        }
    }
}
