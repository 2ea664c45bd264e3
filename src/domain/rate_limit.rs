use std::time::Duration;
use tokio::time::Instant;

/// Fixed-window admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    /// Maximum accepted requests per window.
    pub limit: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Stored entries outlive their window by one second.
    pub fn entry_ttl(&self) -> Duration {
        self.window + Duration::from_secs(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Throttled,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Counter state as of the last accepted request of one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub window_start: Instant,
    pub count: u32,
}

impl RateLimitEntry {
    /// Decides admission for a request arriving at `now`.
    ///
    /// Returns the decision and the entry to store. A throttled request yields no entry:
    /// the previous state stays as it was, so the window only moves on accepted requests.
    pub fn evaluate(
        previous: Option<RateLimitEntry>,
        now: Instant,
        policy: &RatePolicy,
    ) -> (Admission, Option<RateLimitEntry>) {
        let mut entry = previous.unwrap_or(RateLimitEntry {
            window_start: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.window_start) >= policy.window {
            entry = RateLimitEntry {
                window_start: now,
                count: 1,
            };
        } else {
            entry.count = entry.count.saturating_add(1);
        }

        if entry.count > policy.limit {
            (Admission::Throttled, None)
        } else {
            (Admission::Allowed, Some(entry))
        }
    }
}
