pub mod clock;
pub mod cooldown;
pub mod notifications;
pub mod retry;
pub mod rsvp_machine;
pub mod rsvp_queries;
pub mod rsvp_service;
