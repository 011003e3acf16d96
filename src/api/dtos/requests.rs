use crate::domain::models::{event::EventStatus, rsvp::{RsvpMetadata, RsvpOp}};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub organizers: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

#[derive(Deserialize, Default)]
pub struct SubmitRsvpRequest {
    #[serde(default)]
    pub metadata: RsvpMetadata,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub op: RsvpOp,
}

#[derive(Deserialize, Default)]
pub struct ReapplyRequest {
    pub metadata: Option<RsvpMetadata>,
}

#[derive(Deserialize)]
pub struct ListRsvpsQuery {
    pub status: Option<String>,
}
