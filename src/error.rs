use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::domain::models::{event::EventStatus, rsvp::{RsvpOp, RsvpStatus}};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Event not found: {0}")]
    EventNotFound(String),
    #[error("RSVP not found: {0}")]
    RsvpNotFound(String),
    #[error("User {user_id} already has an RSVP ({rsvp_id}) for event {event_id}")]
    DuplicateRsvp { rsvp_id: String, event_id: String, user_id: String },
    #[error("Event {event_id} is full ({max_participants} seats); RSVP {rsvp_id} cannot be approved")]
    CapacityExceeded { rsvp_id: String, event_id: String, max_participants: i32 },
    #[error("User {actor_id} is not allowed to {op} RSVP {rsvp_id}")]
    UnauthorizedTransition { rsvp_id: String, actor_id: String, op: RsvpOp },
    #[error("Cannot {op} RSVP {rsvp_id} while it is {state}")]
    InvalidStateTransition { rsvp_id: String, op: RsvpOp, state: RsvpStatus },
    #[error("RSVP {rsvp_id} for event {event_id} was cancelled recently; reapply in {retry_after_secs}s")]
    CooldownActive { rsvp_id: String, event_id: String, retry_after_secs: i64 },
    #[error("Cannot {op} RSVP {rsvp_id}: kept conflicting with concurrent updates ({attempts} attempts)")]
    ConcurrencyConflict { rsvp_id: String, op: RsvpOp, attempts: u32 },
    #[error("Event {event_id} is {status} and does not accept RSVPs")]
    EventUnavailable { event_id: String, status: EventStatus },
    /// A transaction lost a write race. Retried by the service, never shown to clients directly.
    #[error("Write conflict")]
    WriteConflict,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Stable machine-readable identifier rendered next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) if self.is_unique_violation() => "duplicate",
            AppError::Database(_) => "database",
            AppError::EventNotFound(_) => "event_not_found",
            AppError::RsvpNotFound(_) => "rsvp_not_found",
            AppError::DuplicateRsvp { .. } => "duplicate_rsvp",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::UnauthorizedTransition { .. } => "unauthorized_transition",
            AppError::InvalidStateTransition { .. } => "invalid_state_transition",
            AppError::CooldownActive { .. } => "cooldown_active",
            AppError::ConcurrencyConflict { .. } | AppError::WriteConflict => "concurrency_conflict",
            AppError::EventUnavailable { .. } => "event_unavailable",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::InternalWithMsg(_) => "internal",
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            // 2067 = SQLite Unique Constraint, 1555 = SQLite Primary Key, 23505 = PostgreSQL Unique Violation
            AppError::Database(e) => e.as_database_error()
                .and_then(|db_err| db_err.code())
                .is_some_and(|code| matches!(code.as_ref(), "2067" | "1555" | "23505")),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match &self {
            AppError::Database(e) => {
                if self.is_unique_violation() {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)", "kind": kind }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::EventNotFound(_) | AppError::RsvpNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::DuplicateRsvp { .. }
            | AppError::CapacityExceeded { .. }
            | AppError::InvalidStateTransition { .. }
            | AppError::EventUnavailable { .. }
            | AppError::ConcurrencyConflict { .. }
            | AppError::WriteConflict => (StatusCode::CONFLICT, self.to_string()),
            AppError::UnauthorizedTransition { .. } => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::CooldownActive { retry_after_secs, .. } => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "kind": kind,
                    "retry_after_secs": retry_after_secs
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "kind": kind
        }));

        (status, body).into_response()
    }
}
