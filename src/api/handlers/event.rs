use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{
    requests::{CreateEventRequest, UpdateEventStatusRequest},
    responses::EventResponse,
};
use crate::domain::models::event::{Event, NewEventParams};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    if let Some(max) = payload.max_participants
        && max < 0 {
        return Err(AppError::Validation("max_participants must not be negative".into()));
    }

    let event = Event::new(NewEventParams {
        title: payload.title,
        description: payload.description,
        max_participants: payload.max_participants,
        creator_id: user_id.clone(),
        organizers: payload.organizers,
    });

    let created = state.event_repo.create(&event).await?;
    info!("Created event {} (capacity {:?}) by {}", created.id, created.max_participants, user_id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ledger = state.event_repo.find_ledger(&event_id).await?
        .ok_or_else(|| AppError::EventNotFound(event_id.clone()))?;

    Ok(Json(EventResponse::from(ledger)))
}

pub async fn update_event_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_by_id(&event_id).await?
        .ok_or_else(|| AppError::EventNotFound(event_id.clone()))?;

    if !event.is_organizer(&user_id) {
        return Err(AppError::Forbidden("only organizers can change the event status".into()));
    }

    let updated = state.event_repo.update_status(&event_id, payload.status).await?;
    info!("Event {} is now {} (changed by {})", event_id, updated.status, user_id);

    Ok(Json(updated))
}
