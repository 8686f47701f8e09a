use std::default::Default;

use lobby_shared::{ParticipantId, SyncPolicy};

/// Contains Config properties which will be used by a Guest
#[derive(Clone, Debug)]
pub struct GuestConfig {
    /// Participant id the host knows this guest by
    pub participant: ParticipantId,
    /// Only `ack_backoff_ms` is read on the guest side, to pace resync requests
    pub policy: SyncPolicy,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            participant: ParticipantId::new("guest"),
            policy: SyncPolicy::default(),
        }
    }
}
