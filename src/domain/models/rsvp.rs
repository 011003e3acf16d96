use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpOp {
    Approve,
    Reject,
    Cancel,
    Reapply,
}

#[derive(Debug, Error)]
#[error("unknown RSVP status: {0}")]
pub struct UnknownRsvpStatus(pub String);

impl RsvpStatus {
    pub const ALL: [RsvpStatus; 4] = [
        RsvpStatus::Pending,
        RsvpStatus::Approved,
        RsvpStatus::Rejected,
        RsvpStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Approved => "approved",
            RsvpStatus::Rejected => "rejected",
            RsvpStatus::Cancelled => "cancelled",
        }
    }

    /// The transition table. `None` marks an illegal (state, op) pair.
    pub fn apply(self, op: RsvpOp) -> Option<RsvpStatus> {
        use RsvpOp::*;
        use RsvpStatus::*;

        match (self, op) {
            (Pending, Approve) => Some(Approved),
            (Pending, Reject) => Some(Rejected),
            (Pending | Approved, Cancel) => Some(Cancelled),
            (Rejected | Cancelled, Reapply) => Some(Pending),
            _ => None,
        }
    }

    pub fn holds_seat(self) -> bool {
        self == RsvpStatus::Approved
    }

    /// Rejected and cancelled records are reactivated in place instead of duplicated.
    pub fn is_reusable(self) -> bool {
        matches!(self, RsvpStatus::Rejected | RsvpStatus::Cancelled)
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = UnknownRsvpStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RsvpStatus::Pending),
            "approved" => Ok(RsvpStatus::Approved),
            "rejected" => Ok(RsvpStatus::Rejected),
            "cancelled" => Ok(RsvpStatus::Cancelled),
            other => Err(UnknownRsvpStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for RsvpStatus {
    type Error = UnknownRsvpStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl RsvpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpOp::Approve => "approve",
            RsvpOp::Reject => "reject",
            RsvpOp::Cancel => "cancel",
            RsvpOp::Reapply => "reapply",
        }
    }

    /// Operations initiated by the RSVP owner rather than by an organizer.
    pub fn is_participant_driven(self) -> bool {
        matches!(self, RsvpOp::Cancel | RsvpOp::Reapply)
    }
}

impl fmt::Display for RsvpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant-supplied data carried along with an RSVP. Never inspected by the state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsvpMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RsvpMetadata {
    /// Fields present in `update` win; absent fields keep their current value.
    pub fn merge(&mut self, update: RsvpMetadata) {
        if let Some(dietary) = update.dietary_requirements {
            self.dietary_requirements = Some(dietary);
        }
        if let Some(note) = update.note {
            self.note = Some(note);
        }
        self.extra.extend(update.extra);
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Rsvp {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub status: RsvpStatus,
    pub metadata: Json<RsvpMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_cancelled_at: Option<DateTime<Utc>>,
}

impl Rsvp {
    pub fn new(event_id: String, user_id: String, metadata: RsvpMetadata, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            user_id,
            status: RsvpStatus::Pending,
            metadata: Json(metadata),
            created_at: now,
            updated_at: now,
            last_cancelled_at: None,
        }
    }
}
