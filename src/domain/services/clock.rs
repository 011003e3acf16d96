use chrono::{DateTime, Utc};

/// Source of "now" for time-dependent rules such as the reapply cooldown.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
