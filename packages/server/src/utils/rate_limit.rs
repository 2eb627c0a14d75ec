use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Per-client login attempt counter over a fixed window.
///
/// Only failed attempts are counted; a successful login clears the client's
/// entry. State lives in process memory, so each server instance limits
/// independently.
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: DashMap::new(),
        }
    }

    /// `Err(seconds)` until the window resets when the client is over the limit.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        self.check_at(client, Instant::now())
    }

    pub fn record_failure(&self, client: &str) {
        self.record_failure_at(client, Instant::now());
    }

    pub fn reset(&self, client: &str) {
        self.windows.remove(client);
    }

    /// Drop windows that have already elapsed.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| w.resets_at > now);
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), u64> {
        let Some(window) = self.windows.get(client).map(|w| *w) else {
            return Ok(());
        };
        if now >= window.resets_at || window.count < self.max_attempts {
            return Ok(());
        }
        let remaining = window.resets_at.saturating_duration_since(now);
        Err(remaining.as_secs().max(1))
    }

    fn record_failure_at(&self, client: &str, now: Instant) {
        let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.window,
        });
        if now >= entry.resets_at {
            *entry = Window {
                count: 0,
                resets_at: now + self.window,
            };
        }
        entry.count += 1;
    }
}

/// Periodically prune elapsed windows.
pub async fn run_rate_limit_pruner(limiter: std::sync::Arc<LoginRateLimiter>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        limiter.prune();
    }
}
