use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{event, health, rsvp};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Events
        .route("/api/v1/events", post(event::create_event))
        .route("/api/v1/events/{event_id}", get(event::get_event))
        .route("/api/v1/events/{event_id}/status", put(event::update_event_status))

        // RSVPs by event
        .route("/api/v1/events/{event_id}/rsvps", post(rsvp::submit_rsvp).get(rsvp::list_event_rsvps))
        .route("/api/v1/events/{event_id}/rsvps/me", get(rsvp::my_event_rsvp))
        .route("/api/v1/events/{event_id}/rsvps/summary", get(rsvp::event_rsvp_summary))

        // RSVPs by caller / id
        .route("/api/v1/me/rsvps", get(rsvp::my_rsvps))
        .route("/api/v1/rsvps/{rsvp_id}", get(rsvp::get_rsvp))
        .route("/api/v1/rsvps/{rsvp_id}/transition", post(rsvp::transition_rsvp))
        .route("/api/v1/rsvps/{rsvp_id}/reapply", post(rsvp::reapply_rsvp))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
