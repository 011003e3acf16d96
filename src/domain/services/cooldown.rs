use chrono::{DateTime, Duration, Utc};

/// Wait imposed between cancelling an RSVP and reapplying for the same event.
/// Shared by every event; only the process-wide setting can change it.
pub const DEFAULT_COOLDOWN_SECS: i64 = 600;

#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    window: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl CooldownPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window: window.max(Duration::zero()) }
    }

    /// Time left before a reapply is allowed, or `None` once the window has elapsed.
    pub fn remaining(&self, last_cancelled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
        let cancelled_at = last_cancelled_at?;
        let elapsed = now - cancelled_at;
        if elapsed >= self.window {
            return None;
        }
        // A cancellation stamped in the future (clock skew) never extends past one window.
        Some((self.window - elapsed).min(self.window))
    }
}

/// Whole seconds, rounded up so an active cooldown never reports zero.
pub fn ceil_seconds(remaining: Duration) -> i64 {
    let millis = remaining.num_milliseconds();
    ((millis + 999) / 1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_cancelled_has_no_cooldown() {
        let policy = CooldownPolicy::default();
        assert!(policy.remaining(None, Utc::now()).is_none());
    }

    #[test]
    fn test_cooldown_active_inside_window() {
        let policy = CooldownPolicy::new(Duration::minutes(10));
        let cancelled = Utc::now();
        let now = cancelled + Duration::minutes(4);

        let remaining = policy.remaining(Some(cancelled), now).unwrap();
        assert_eq!(remaining, Duration::minutes(6));
        assert_eq!(ceil_seconds(remaining), 360);
    }

    #[test]
    fn test_cooldown_ends_exactly_at_window() {
        let policy = CooldownPolicy::new(Duration::minutes(10));
        let cancelled = Utc::now();

        assert!(policy.remaining(Some(cancelled), cancelled + Duration::minutes(10)).is_none());
        assert!(policy.remaining(Some(cancelled), cancelled + Duration::minutes(11)).is_none());
    }

    #[test]
    fn test_future_cancellation_is_capped_to_window() {
        let policy = CooldownPolicy::new(Duration::minutes(10));
        let now = Utc::now();

        let remaining = policy.remaining(Some(now + Duration::hours(2)), now).unwrap();
        assert_eq!(remaining, Duration::minutes(10));
    }

    #[test]
    fn test_sub_second_remainder_rounds_up() {
        assert_eq!(ceil_seconds(Duration::milliseconds(1)), 1);
        assert_eq!(ceil_seconds(Duration::seconds(5)), 5);
    }
}
