use chrono::{DateTime, Duration, Utc};

/// Consecutive failures that lock an admin account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

pub fn lock_duration() -> Duration {
    Duration::hours(2)
}

/// Failed-login bookkeeping stored on the admin row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttempts {
    pub count: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

impl LoginAttempts {
    /// State after another failed password check at `now`.
    ///
    /// An expired lock is cleared and counting restarts at 1. Reaching
    /// `MAX_FAILED_ATTEMPTS` without an active lock sets one.
    pub fn after_failure(self, now: DateTime<Utc>) -> Self {
        if let Some(until) = self.lock_until
            && until <= now
        {
            return Self {
                count: 1,
                lock_until: None,
            };
        }

        let count = self.count.saturating_add(1);
        let lock_until = match self.lock_until {
            None if count >= MAX_FAILED_ATTEMPTS => Some(now + lock_duration()),
            current => current,
        };
        Self { count, lock_until }
    }

    /// State after a successful login.
    pub fn after_success() -> Self {
        Self {
            count: 0,
            lock_until: None,
        }
    }
}
