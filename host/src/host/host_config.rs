use std::{default::Default, time::Duration};

use lobby_shared::{ParticipantId, SyncPolicy};

/// Contains Config properties which will be used by the Host
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// The host's own participant id; commands it issues act as this id
    pub participant: ParticipantId,
    /// Name the host joins the roster under
    pub display_name: String,
    /// Initial policy; tunable later through `Host::update_policy`
    pub policy: SyncPolicy,
    /// How often the runtime looks for peers with stalled acks
    pub stall_check_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            participant: ParticipantId::new("host"),
            display_name: "Host".to_string(),
            policy: SyncPolicy::default(),
            stall_check_interval: Duration::from_millis(1000),
        }
    }
}
