mod common;

use common::TestApp;
use rsvp_backend::{
    config::RsvpSettings,
    domain::models::rsvp::{RsvpMetadata, RsvpOp, RsvpStatus},
    error::AppError,
};
use std::collections::BTreeSet;
use tokio::task::JoinSet;

const ORGANIZER: &str = "org-1";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_approvals_fill_exactly_the_available_seats() {
    // Default retry budget: losers of a write race retry instead of giving up.
    let app = TestApp::with_settings(RsvpSettings::default()).await;
    let capacity = 3;
    let event = app.seed_event(ORGANIZER, Some(capacity), &[]).await;

    let mut rsvp_ids = Vec::new();
    for i in 0..12 {
        let rsvp = app.state.rsvp_service.submit(&event.id, &format!("user-{}", i), RsvpMetadata::default()).await.unwrap();
        rsvp_ids.push(rsvp.id);
    }

    let mut set = JoinSet::new();
    for rsvp_id in rsvp_ids {
        let service = app.state.rsvp_service.clone();
        set.spawn(async move { service.transition(&rsvp_id, ORGANIZER, RsvpOp::Approve).await });
    }

    let mut committed = 0;
    while let Some(joined) = set.join_next().await {
        match joined.unwrap() {
            Ok(rsvp) => {
                assert_eq!(rsvp.status, RsvpStatus::Approved);
                committed += 1;
            }
            Err(AppError::CapacityExceeded { .. }) | Err(AppError::ConcurrencyConflict { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    let approved: BTreeSet<String> = app.state.rsvp_service
        .get_by_event(&event.id, Some(RsvpStatus::Approved)).await.unwrap()
        .into_iter()
        .map(|r| r.user_id)
        .collect();
    let participants: BTreeSet<String> = app.participants(&event.id).await.into_iter().collect();

    assert_eq!(committed, capacity as usize, "{} approved for {} seats", committed, capacity);
    assert_eq!(approved.len(), committed);
    assert_eq!(participants, approved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_approve_leaves_consistent_ledger() {
    let app = TestApp::new().await;
    let event = app.seed_event(ORGANIZER, Some(5), &[]).await;

    for round in 0..5 {
        let user_id = format!("user-{}", round);
        let rsvp = app.state.rsvp_service.submit(&event.id, &user_id, RsvpMetadata::default()).await.unwrap();

        let approve = {
            let service = app.state.rsvp_service.clone();
            let id = rsvp.id.clone();
            tokio::spawn(async move { service.transition(&id, ORGANIZER, RsvpOp::Approve).await })
        };
        let cancel = {
            let service = app.state.rsvp_service.clone();
            let id = rsvp.id.clone();
            let user = user_id.clone();
            tokio::spawn(async move { service.transition(&id, &user, RsvpOp::Cancel).await })
        };
        let _ = approve.await.unwrap();
        let _ = cancel.await.unwrap();

        let stored = app.state.rsvp_service.get(&rsvp.id).await.unwrap();
        let seated = app.participants(&event.id).await.contains(&user_id);
        assert_eq!(seated, stored.status == RsvpStatus::Approved, "round {}: {:?}", round, stored.status);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submits_create_a_single_rsvp() {
    let app = TestApp::new().await;
    let event = app.seed_event(ORGANIZER, None, &[]).await;

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let service = app.state.rsvp_service.clone();
        let event_id = event.id.clone();
        set.spawn(async move { service.submit(&event_id, "user-a", RsvpMetadata::default()).await });
    }

    let mut created = 0;
    while let Some(joined) = set.join_next().await {
        match joined.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.kind(), "duplicate_rsvp", "unexpected error: {:?}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(app.state.rsvp_service.get_by_event(&event.id, None).await.unwrap().len(), 1);
}
