use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
    Closed,
}

#[derive(Debug, Error)]
#[error("unknown event status: {0}")]
pub struct UnknownEventStatus(pub String);

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Closed => "closed",
        }
    }

    pub fn accepts_rsvps(self) -> bool {
        self == EventStatus::Active
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = UnknownEventStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EventStatus::Active),
            "cancelled" => Ok(EventStatus::Cancelled),
            "closed" => Ok(EventStatus::Closed),
            other => Err(UnknownEventStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = UnknownEventStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    /// `None` means no capacity is enforced. `Some(0)` is a real limit of zero seats.
    pub max_participants: Option<i32>,
    pub creator_id: String,
    pub organizers: Json<Vec<String>>,
    /// Bumped on every participant-set mutation; used as the optimistic concurrency token.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewEventParams {
    pub title: String,
    pub description: Option<String>,
    pub max_participants: Option<i32>,
    pub creator_id: String,
    pub organizers: Vec<String>,
}

impl Event {
    pub fn new(params: NewEventParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            status: EventStatus::Active,
            max_participants: params.max_participants,
            creator_id: params.creator_id,
            organizers: Json(params.organizers),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_organizer(&self, user_id: &str) -> bool {
        self.creator_id == user_id || self.organizers.iter().any(|o| o == user_id)
    }

    /// Creator first, then listed organizers, without duplicates.
    pub fn organizer_ids(&self) -> Vec<String> {
        let mut ids = vec![self.creator_id.clone()];
        for organizer in self.organizers.iter() {
            if !ids.contains(organizer) {
                ids.push(organizer.clone());
            }
        }
        ids
    }
}

/// An event together with the set of users currently holding a confirmed seat.
#[derive(Debug, Clone)]
pub struct EventLedger {
    pub event: Event,
    pub participants: BTreeSet<String>,
}

impl EventLedger {
    pub fn new(event: Event, participants: impl IntoIterator<Item = String>) -> Self {
        Self {
            event,
            participants: participants.into_iter().collect(),
        }
    }

    pub fn occupancy(&self) -> usize {
        self.participants.len()
    }

    pub fn has_seat(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    pub fn is_full(&self) -> bool {
        match self.event.max_participants {
            Some(max) => self.occupancy() >= max.max(0) as usize,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(max: Option<i32>) -> Event {
        Event::new(NewEventParams {
            title: "Board games".into(),
            description: None,
            max_participants: max,
            creator_id: "creator".into(),
            organizers: vec!["co-host".into(), "creator".into()],
        })
    }

    #[test]
    fn test_unbounded_event_is_never_full() {
        let ledger = EventLedger::new(event(None), (0..500).map(|i| format!("user-{}", i)));
        assert!(!ledger.is_full());
    }

    #[test]
    fn test_zero_capacity_is_a_real_limit() {
        let ledger = EventLedger::new(event(Some(0)), Vec::<String>::new());
        assert!(ledger.is_full());
    }

    #[test]
    fn test_organizer_ids_are_deduplicated() {
        let ev = event(Some(3));
        assert_eq!(ev.organizer_ids(), vec!["creator".to_string(), "co-host".to_string()]);
        assert!(ev.is_organizer("co-host"));
        assert!(!ev.is_organizer("guest"));
    }
}
