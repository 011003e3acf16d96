pub mod sqlite_event_repo;
pub mod sqlite_rsvp_repo;
pub mod sqlite_notification_repo;

pub mod postgres_event_repo;
pub mod postgres_rsvp_repo;
pub mod postgres_notification_repo;
