use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who may force-cancel a pending travel proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelCancelPolicy {
    HostOnly,
    HostOrProposer,
}

/// One sliding-window bucket. Every kind in `kinds` draws from the same
/// per-participant budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub bucket: String,
    pub kinds: Vec<String>,
    pub limit: usize,
    pub window_ms: u64,
}

impl RateLimitRule {
    pub fn new(bucket: &str, kinds: &[&str], limit: usize, window_ms: u64) -> Self {
        Self {
            bucket: bucket.to_string(),
            kinds: kinds.iter().map(|kind| kind.to_string()).collect(),
            limit,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Tunable knobs for replication, backpressure and command admission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// Minimum gap between two snapshot re-requests (guest) or stall
    /// recoveries (host) for the same object
    pub ack_backoff_ms: u64,
    /// Reference size of a peer channel's send buffer
    pub queue_threshold_bytes: usize,
    /// Above `threshold * high_water_factor` buffered bytes, sends are queued
    pub high_water_factor: f64,
    /// A flush stops once buffered bytes would pass `threshold * flush_factor`
    pub flush_factor: f64,
    /// Pending messages kept per peer; the oldest is dropped beyond this
    pub max_queue: usize,
    /// How long a peer's ack may trail the current revision before it is
    /// sent a fresh snapshot
    pub patch_stall_timeout_ms: u64,
    /// Patches whose serialized ops exceed this many bytes are sent as a
    /// full replace instead
    pub snapshot_compression_threshold_bytes: usize,
    /// Lifetime of a pending interaction invite
    pub invite_ttl_ms: u64,
    pub travel_cancel: TravelCancelPolicy,
    pub rate_limits: Vec<RateLimitRule>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            ack_backoff_ms: 1000,
            queue_threshold_bytes: 262_144,
            high_water_factor: 1.0,
            flush_factor: 0.5,
            max_queue: 512,
            patch_stall_timeout_ms: 5000,
            snapshot_compression_threshold_bytes: 16_384,
            invite_ttl_ms: 30_000,
            travel_cancel: TravelCancelPolicy::HostOrProposer,
            rate_limits: vec![
                RateLimitRule::new("ready", &["ready"], 5, 10_000),
                RateLimitRule::new("chat", &["chat:append:request"], 8, 10_000),
                RateLimitRule::new("travel:propose", &["map:travel:propose"], 3, 30_000),
                RateLimitRule::new("travel:vote", &["map:travel:vote"], 10, 10_000),
                RateLimitRule::new("object:request", &["object:request"], 20, 10_000),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy document could not be parsed: {reason}")]
    Malformed { reason: String },
    #[error("Invalid policy: {reason}")]
    Invalid { reason: String },
}

impl SyncPolicy {
    /// Parse a (possibly partial) JSON policy document over the defaults.
    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let policy: SyncPolicy =
            serde_json::from_str(text).map_err(|err| PolicyError::Malformed {
                reason: err.to_string(),
            })?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_queue == 0 {
            return Err(PolicyError::Invalid {
                reason: "max_queue must be at least 1".to_string(),
            });
        }
        if self.high_water_factor <= 0.0 || self.flush_factor <= 0.0 {
            return Err(PolicyError::Invalid {
                reason: "water-mark factors must be positive".to_string(),
            });
        }
        if self.flush_factor > self.high_water_factor {
            return Err(PolicyError::Invalid {
                reason: "flush_factor must not exceed high_water_factor".to_string(),
            });
        }
        for rule in &self.rate_limits {
            if rule.limit == 0 || rule.window_ms == 0 {
                return Err(PolicyError::Invalid {
                    reason: format!("rate limit bucket {} has a zero limit or window", rule.bucket),
                });
            }
        }
        Ok(())
    }

    pub fn high_water_mark(&self) -> usize {
        (self.queue_threshold_bytes as f64 * self.high_water_factor) as usize
    }

    pub fn flush_mark(&self) -> usize {
        (self.queue_threshold_bytes as f64 * self.flush_factor) as usize
    }

    pub fn ack_backoff(&self) -> Duration {
        Duration::from_millis(self.ack_backoff_ms)
    }

    pub fn patch_stall_timeout(&self) -> Duration {
        Duration::from_millis(self.patch_stall_timeout_ms)
    }

    pub fn invite_ttl(&self) -> Duration {
        Duration::from_millis(self.invite_ttl_ms)
    }
}

/// Shared, runtime-tunable handle to the active [`SyncPolicy`].
///
/// Readers take a cloned snapshot so no lock is held across a command.
/// Every committed update bumps [`PolicyStore::generation`], so holders of
/// derived state (rate-limit buckets) can tell when to rebuild it.
#[derive(Clone, Debug, Default)]
pub struct PolicyStore {
    inner: Arc<RwLock<Versioned>>,
}

#[derive(Debug, Default)]
struct Versioned {
    policy: SyncPolicy,
    generation: u64,
}

impl PolicyStore {
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                policy,
                generation: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> SyncPolicy {
        self.read(|versioned| versioned.policy.clone())
    }

    /// Bumped once per committed update
    pub fn generation(&self) -> u64 {
        self.read(|versioned| versioned.generation)
    }

    /// Apply `f` to a copy of the policy and commit it only if it validates.
    /// On error the active policy is left untouched.
    pub fn update(&self, f: impl FnOnce(&mut SyncPolicy)) -> Result<(), PolicyError> {
        let mut versioned = match self.inner.write() {
            Ok(versioned) => versioned,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = versioned.policy.clone();
        f(&mut next);
        next.validate()?;
        versioned.policy = next;
        versioned.generation += 1;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Versioned) -> T) -> T {
        match self.inner.read() {
            Ok(versioned) => f(&versioned),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}
