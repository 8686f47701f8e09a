//! The lobby's shared objects.
//!
//! | object     | model            |
//! |------------|------------------|
//! | `roster`   | [`Roster`]       |
//! | `chat`     | [`ChatLog`]      |
//! | `world`    | [`World`]        |
//! | `actors`   | [`Loadouts`]     |
//! | `travel`   | [`Travel`]       |
//! | `interact` | [`Interactions`] |

pub mod chat;
pub mod interactions;
pub mod loadouts;
pub mod quorum;
pub mod roster;
pub mod travel;
pub mod world;

pub use chat::{ChatEntry, ChatLog, ChatState};
pub use interactions::{Interactions, InteractionsState, Invite, InviteStatus};
pub use loadouts::{ActorSheet, Loadouts, LoadoutsState};
pub use quorum::{tally, Quorum, VoteStatus};
pub use roster::{Member, Roster, RosterState};
pub use travel::{Travel, TravelInvite, TravelState};
pub use world::{World, WorldState};

use crate::sync_model::{Registry, RegistryError};

/// Register every lobby model on `registry`.
pub fn register_all(registry: &mut Registry) -> Result<(), RegistryError> {
    registry
        .register::<Roster>()?
        .register::<ChatLog>()?
        .register::<World>()?
        .register::<Loadouts>()?
        .register::<Travel>()?
        .register::<Interactions>()?;
    Ok(())
}

/// A registry holding every lobby model.
pub fn default_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
