//! # Lobby Host
//! The authoritative lobby participant. Validates, rate-limits and applies
//! guest commands against registered sync models, and replicates every
//! accepted change to connected guests through backpressure-aware queues.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod peer;
pub mod runtime;

mod ack_tracker;
mod host;
mod rate_limiter;

pub use ack_tracker::AckTracker;
pub use host::{Host, HostConfig, HostEffect, HostError};
pub use peer::{ChannelState, PeerChannel, PeerQueues, PeerSendQueue, SendError, SendOutcome};
pub use rate_limiter::{RateLimiter, RateLimits};
pub use runtime::{HostHandle, HostInput, HostRuntime, NarrationError, Narrator, NullNarrator};
