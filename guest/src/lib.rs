//! # Lobby Guest
//! A lobby participant that keeps read-only replicas of the host's shared
//! objects. Snapshots replace a replica when newer; patches apply only on
//! top of the exact previous revision, and anything else triggers a resync.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod error;
mod guest;
mod guest_config;
mod object_store;

pub use error::GuestError;
pub use guest::{Guest, GuestEvent};
pub use guest_config::GuestConfig;
pub use object_store::{ClientObjectState, ObjectStore, PatchResult};
