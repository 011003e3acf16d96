use std::sync::Arc;
use crate::domain::ports::{EventRepository, NotificationEmitter, RsvpRepository};
use crate::domain::services::{clock::Clock, rsvp_service::RsvpService};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub event_repo: Arc<dyn EventRepository>,
    pub rsvp_service: Arc<RsvpService>,
}

impl AppState {
    pub fn new(
        config: Config,
        event_repo: Arc<dyn EventRepository>,
        rsvp_repo: Arc<dyn RsvpRepository>,
        notification_emitter: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rsvp_service = Arc::new(RsvpService::new(
            rsvp_repo,
            event_repo.clone(),
            notification_emitter,
            clock,
            &config.rsvp,
        ));

        Self {
            config,
            event_repo,
            rsvp_service,
        }
    }
}
