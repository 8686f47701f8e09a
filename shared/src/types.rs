use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-object version counter. Bumped by exactly one on every accepted mutation.
pub type Revision = u64;

/// Identifies a lobby participant. Guests are addressed by the same id they
/// appear under in the roster, so it doubles as the peer id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

pub type PeerId = ParticipantId;

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who issued a command: the host itself, or a remote guest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Actor {
    Host(ParticipantId),
    Guest(ParticipantId),
}

impl Actor {
    pub fn participant(&self) -> &ParticipantId {
        match self {
            Actor::Host(id) | Actor::Guest(id) => id,
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Actor::Host(_))
    }

    /// True if this actor is the host or is the given participant
    pub fn is_host_or(&self, participant: &str) -> bool {
        self.is_host() || self.participant().as_str() == participant
    }
}
