use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{ListRsvpsQuery, ReapplyRequest, SubmitRsvpRequest, TransitionRequest};
use crate::domain::models::rsvp::{RsvpOp, RsvpStatus};
use crate::error::AppError;
use std::sync::Arc;

pub async fn submit_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<SubmitRsvpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = state.rsvp_service.submit(&event_id, &user_id, payload.metadata).await?;
    Ok((StatusCode::CREATED, Json(rsvp)))
}

pub async fn list_event_rsvps(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(event_id): Path<String>,
    Query(query): Query<ListRsvpsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<RsvpStatus>().map_err(|e| AppError::Validation(e.to_string()))?),
    };

    let rsvps = state.rsvp_service.get_by_event(&event_id, status).await?;
    Ok(Json(rsvps))
}

pub async fn my_event_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = state.rsvp_service.find_one(&event_id, &user_id).await?;
    Ok(Json(rsvp))
}

pub async fn event_rsvp_summary(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.rsvp_service.summary(&event_id).await?;
    Ok(Json(summary))
}

pub async fn my_rsvps(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rsvps = state.rsvp_service.get_by_user(&user_id).await?;
    Ok(Json(rsvps))
}

pub async fn get_rsvp(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(rsvp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = state.rsvp_service.get(&rsvp_id).await?;
    Ok(Json(rsvp))
}

pub async fn transition_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(rsvp_id): Path<String>,
    Json(payload): Json<TransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.op == RsvpOp::Reapply {
        return Err(AppError::Validation("use the reapply endpoint to reapply".into()));
    }

    let rsvp = state.rsvp_service.transition(&rsvp_id, &user_id, payload.op).await?;
    Ok(Json(rsvp))
}

pub async fn reapply_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(rsvp_id): Path<String>,
    Json(payload): Json<ReapplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rsvp = state.rsvp_service.reapply(&rsvp_id, &user_id, payload.metadata).await?;
    Ok(Json(rsvp))
}
