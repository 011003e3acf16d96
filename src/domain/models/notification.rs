use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RsvpPending,
    RsvpApproved,
    RsvpRejected,
    RsvpCancelled,
    /// Organizer-facing counterpart of every participant-driven transition.
    RsvpReceived,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RsvpPending => "rsvp_pending",
            NotificationType::RsvpApproved => "rsvp_approved",
            NotificationType::RsvpRejected => "rsvp_rejected",
            NotificationType::RsvpCancelled => "rsvp_cancelled",
            NotificationType::RsvpReceived => "rsvp_received",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub related_event_id: String,
}

/// A persisted notification as written by the store-backed emitters.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub notification_type: String,
    pub message: String,
    pub related_event_id: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn from_payload(payload: &NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: payload.user_id.clone(),
            notification_type: payload.kind.as_str().to_string(),
            message: payload.message.clone(),
            related_event_id: payload.related_event_id.clone(),
            created_at: Utc::now(),
        }
    }
}
