mod common;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use common::TestApp;
use rsvp_backend::{
    domain::{
        models::rsvp::{Rsvp, RsvpMetadata},
        ports::RsvpRepository,
    },
    error::AppError,
    infra::repositories::sqlite_rsvp_repo::SqliteRsvpRepo,
};
use serde_json::{json, Value};

const ORGANIZER: &str = "org-1";

async fn create_event(app: &TestApp, max_participants: Option<i32>) -> String {
    let (status, body, _) = app.request(
        "POST",
        "/api/v1/events",
        Some(ORGANIZER),
        Some(json!({ "title": "Rooftop screening", "max_participants": max_participants })),
    ).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["creator_id"], ORGANIZER);
    assert_eq!(body["status"], "active");
    body["id"].as_str().unwrap().to_string()
}

async fn submit(app: &TestApp, event_id: &str, user: &str) -> String {
    let (status, body, _) = app.request(
        "POST",
        &format!("/api/v1/events/{}/rsvps", event_id),
        Some(user),
        Some(json!({ "metadata": { "dietary_requirements": "none", "plus_one": true } })),
    ).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["metadata"]["plus_one"], true);
    body["id"].as_str().unwrap().to_string()
}

async fn transition(app: &TestApp, rsvp_id: &str, actor: &str, op: &str) -> (StatusCode, serde_json::Value) {
    let (status, body, _) = app.request(
        "POST",
        &format!("/api/v1/rsvps/{}/transition", rsvp_id),
        Some(actor),
        Some(json!({ "op": op })),
    ).await;
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body, _) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let (status, body, _) = app.request("GET", "/api/v1/me/rsvps", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _, _) = app.request("POST", "/api/v1/events", None, Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_capacity_flow_over_http() {
    let app = TestApp::new().await;
    let event_id = create_event(&app, Some(1)).await;

    let a = submit(&app, &event_id, "user-a").await;
    let b = submit(&app, &event_id, "user-b").await;

    let (status, body) = transition(&app, &a, ORGANIZER, "approve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, body) = transition(&app, &b, ORGANIZER, "approve").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "capacity_exceeded");

    let (status, body, _) = app.request("GET", &format!("/api/v1/events/{}", event_id), Some("user-b"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["occupancy"], 1);
    assert_eq!(body["seats_left"], 0);
    assert_eq!(body["participants"], json!(["user-a"]));

    let (status, body) = transition(&app, &a, "user-a", "cancel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(body["last_cancelled_at"].is_string());

    let (status, _) = transition(&app, &b, ORGANIZER, "approve").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body, _) = app.request("GET", &format!("/api/v1/events/{}", event_id), Some(ORGANIZER), None).await;
    assert_eq!(body["participants"], json!(["user-b"]));
}

#[tokio::test]
async fn test_error_kinds_and_statuses() {
    let app = TestApp::new().await;
    let event_id = create_event(&app, None).await;
    let rsvp_id = submit(&app, &event_id, "user-a").await;

    let (status, body, _) = app.request("POST", &format!("/api/v1/events/{}/rsvps", event_id), Some("user-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate_rsvp");

    let (status, body) = transition(&app, &rsvp_id, "user-a", "approve").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "unauthorized_transition");

    let (status, body, _) = app.request("POST", &format!("/api/v1/rsvps/{}/reapply", rsvp_id), Some("user-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_state_transition");

    let (status, body) = transition(&app, &rsvp_id, "user-a", "reapply").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = transition(&app, "missing", ORGANIZER, "approve").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "rsvp_not_found");

    let (status, body, _) = app.request("POST", "/api/v1/events/missing/rsvps", Some("user-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "event_not_found");

    let (status, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps?status=maybe", event_id), Some(ORGANIZER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_storage_level_duplicates_report_duplicate_kind() {
    let app = TestApp::new().await;
    let event = app.seed_event(ORGANIZER, None, &[]).await;

    let err = app.state.event_repo.create(&event).await.unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
    assert_eq!(err.kind(), "duplicate");
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate");

    let repo = SqliteRsvpRepo::new(app.pool.clone());
    repo.create(&Rsvp::new(event.id.clone(), "user-a".into(), RsvpMetadata::default(), Utc::now())).await.unwrap();
    let err = repo.create(&Rsvp::new(event.id.clone(), "user-a".into(), RsvpMetadata::default(), Utc::now())).await.unwrap_err();
    assert!(err.is_unique_violation(), "got {:?}", err);
    assert_eq!(err.kind(), "duplicate");
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate");
}

#[tokio::test]
async fn test_cooldown_returns_retry_after() {
    let app = TestApp::new().await;
    let event_id = create_event(&app, None).await;
    let rsvp_id = submit(&app, &event_id, "user-a").await;

    let (status, _) = transition(&app, &rsvp_id, "user-a", "cancel").await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::seconds(90));

    let (status, body, headers) = app.request("POST", &format!("/api/v1/rsvps/{}/reapply", rsvp_id), Some("user-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["kind"], "cooldown_active");
    assert_eq!(body["retry_after_secs"], 510);
    assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "510");

    app.clock.advance(Duration::seconds(510));

    let (status, body, _) = app.request(
        "POST",
        &format!("/api/v1/rsvps/{}/reapply", rsvp_id),
        Some("user-a"),
        Some(json!({ "metadata": { "note": "can make it after all" } })),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["metadata"]["note"], "can make it after all");
    assert_eq!(body["metadata"]["dietary_requirements"], "none");
}

#[tokio::test]
async fn test_event_status_changes_are_organizer_only() {
    let app = TestApp::new().await;
    let event_id = create_event(&app, None).await;
    let uri = format!("/api/v1/events/{}/status", event_id);

    let (status, body, _) = app.request("PUT", &uri, Some("user-a"), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, body, _) = app.request("PUT", &uri, Some(ORGANIZER), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body, _) = app.request("POST", &format!("/api/v1/events/{}/rsvps", event_id), Some("user-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "event_unavailable");
}

#[tokio::test]
async fn test_query_endpoints() {
    let app = TestApp::new().await;
    let event_id = create_event(&app, None).await;
    let a = submit(&app, &event_id, "user-a").await;
    submit(&app, &event_id, "user-b").await;
    transition(&app, &a, ORGANIZER, "approve").await;

    let (status, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps?status=approved", event_id), Some(ORGANIZER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["user_id"], "user-a");

    let (_, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps", event_id), Some(ORGANIZER), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps/summary", event_id), Some(ORGANIZER), None).await;
    assert_eq!(body, json!({ "pending": 1, "approved": 1, "rejected": 0, "cancelled": 0, "total": 2 }));

    let (_, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps/me", event_id), Some("user-b"), None).await;
    assert_eq!(body["status"], "pending");

    let (status, body, _) = app.request("GET", &format!("/api/v1/events/{}/rsvps/me", event_id), Some("stranger"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (_, body, _) = app.request("GET", "/api/v1/me/rsvps", Some("user-a"), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], a);

    let (status, body, _) = app.request("GET", &format!("/api/v1/rsvps/{}", a), Some("user-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
}
