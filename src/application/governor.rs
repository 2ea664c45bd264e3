use crate::domain::rate_limit::{Admission, RateLimitEntry, RatePolicy};
use crate::infrastructure::expiring::ExpiringStore;
use tokio::time::Instant;

const KEY_PREFIX: &str = "rate_limit:";

/// Per-caller fixed-window request limiter.
///
/// Counters live in an injected [`ExpiringStore`]; each decision is made under the store's
/// lock, so concurrent requests from one caller are counted one at a time.
#[derive(Clone)]
pub struct RateGovernor {
    store: ExpiringStore<String, RateLimitEntry>,
    policy: RatePolicy,
}

impl RateGovernor {
    pub fn new(store: ExpiringStore<String, RateLimitEntry>, policy: RatePolicy) -> Self {
        Self { store, policy }
    }

    pub fn admit(&self, caller_key: &str) -> Admission {
        self.admit_with(caller_key, &self.policy)
    }

    pub fn admit_with(&self, caller_key: &str, policy: &RatePolicy) -> Admission {
        let key = format!("{KEY_PREFIX}{caller_key}");
        let ttl = policy.entry_ttl();
        self.store.update(key, |previous| {
            let (admission, next) = RateLimitEntry::evaluate(previous, Instant::now(), policy);
            (admission, next.map(|entry| (entry, ttl)))
        })
    }
}
