use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use lobby_shared::SyncPolicy;

/// Sliding-window admission control: at most `limit` accepted calls per key
/// within any trailing `window`.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    windows: HashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: HashMap::new(),
        }
    }

    pub fn allow(&mut self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Denied calls are not recorded, so a flood does not extend its own
    /// lockout.
    pub fn allow_at(&mut self, key: &str, now: Instant) -> bool {
        let window = self.window;
        let timestamps = self.windows.entry(key.to_string()).or_default();
        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        if timestamps.len() < self.limit {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Forget keys with no calls inside the window
    pub fn purge(&mut self, now: Instant) {
        let window = self.window;
        self.windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// One [`RateLimiter`] per policy bucket, keyed by `"<bucket>:<participant>"`
/// so one participant cannot spend another's budget.
pub struct RateLimits {
    limiters: HashMap<String, RateLimiter>,
    bucket_of_kind: HashMap<String, String>,
}

impl RateLimits {
    pub fn from_policy(policy: &SyncPolicy) -> Self {
        let mut limiters = HashMap::new();
        let mut bucket_of_kind = HashMap::new();
        for rule in &policy.rate_limits {
            limiters.insert(rule.bucket.clone(), RateLimiter::new(rule.limit, rule.window()));
            for kind in &rule.kinds {
                bucket_of_kind.insert(kind.clone(), rule.bucket.clone());
            }
        }
        Self {
            limiters,
            bucket_of_kind,
        }
    }

    /// Kinds without a bucket are always allowed
    pub fn allow_at(&mut self, kind: &str, participant: &str, now: Instant) -> bool {
        let Some(bucket) = self.bucket_of_kind.get(kind) else {
            return true;
        };
        let Some(limiter) = self.limiters.get_mut(bucket) else {
            return true;
        };
        limiter.allow_at(&format!("{}:{}", bucket, participant), now)
    }

    pub fn purge(&mut self, now: Instant) {
        for limiter in self.limiters.values_mut() {
            limiter.purge(now);
        }
    }
}
