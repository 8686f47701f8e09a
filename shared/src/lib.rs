//! # Lobby Shared
//! Common functionality shared between lobby-host & lobby-guest crates: the
//! wire envelope, patch ops, sync models and the authoritative replicator.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod content;
mod policy;
mod types;

pub mod models;
pub mod patch;
pub mod replication;
pub mod sync_model;
pub mod wire;

pub use backends::{TimeError, Timestamp};
pub use content::{CharacterDef, Content, ItemStack, MapDef, StaticContent};
pub use patch::{apply_ops, PatchError, PatchOp};
pub use policy::{PolicyError, PolicyStore, RateLimitRule, SyncPolicy, TravelCancelPolicy};
pub use replication::{
    Change, ChangePayload, DispatchStatus, Dispatched, ObjectsView, ReplicatedObject, Replicator,
};
pub use sync_model::{
    parse_body, CommandContext, Effect, ModelEntry, NoObjects, Outcome, Registry, RegistryError,
    StateSource, SyncModel, DEFAULT_INCREMENTAL_MAX,
};
pub use types::{Actor, ParticipantId, PeerId, Revision};
pub use wire::{Envelope, ObjectMessage, Scope, WireError, PROTOCOL_VERSION};
