use std::{collections::BTreeMap, sync::Arc};

use log::debug;
use serde_json::{json, Value};

use lobby_guest::{Guest, GuestConfig};
use lobby_host::{Host, HostConfig};
use lobby_shared::{
    models::{self, roster},
    PeerId, Registry, SyncPolicy,
};

use crate::local_channel::{ChannelProbe, LocalChannel};

use super::test_content::{test_content, TAVERN};

pub const HOST_ID: &str = "host";

/// Rounds `exchange` will run before giving up on a chatty lobby
const MAX_ROUNDS: usize = 64;

/// One guest plus the test's view of its channel
pub struct TestGuest {
    pub guest: Guest,
    pub probe: ChannelProbe,
}

/// A host and any number of guests wired together over local channels.
///
/// Nothing moves until the test calls [`TestLobby::exchange`] (or one of the
/// one-way delivery helpers), so congestion and loss can be staged between
/// steps.
pub struct TestLobby {
    pub host: Host,
    registry: Arc<Registry>,
    policy: SyncPolicy,
    guests: BTreeMap<String, TestGuest>,
}

impl TestLobby {
    pub fn new() -> Self {
        Self::with_policy(SyncPolicy::default())
    }

    pub fn with_policy(policy: SyncPolicy) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let registry = Arc::new(models::default_registry().unwrap());
        let config = HostConfig {
            policy: policy.clone(),
            ..Default::default()
        };
        let mut host = Host::new(config, registry.clone(), Arc::new(test_content()));
        host.command(
            "world:place",
            json!({ "participant": HOST_ID, "mapId": TAVERN }),
        );
        Self {
            host,
            registry,
            policy,
            guests: BTreeMap::new(),
        }
    }

    /// Seat `id` in the tavern, connect it and let it request its snapshots
    pub fn join(&mut self, id: &str) -> &mut Self {
        self.host
            .command(roster::JOIN_KIND, json!({ "id": id, "name": id.to_uppercase() }));
        self.host
            .command("world:place", json!({ "participant": id, "mapId": TAVERN }));

        let (channel, probe) = LocalChannel::new();
        self.host.connect_peer(PeerId::from(id), Box::new(channel));

        let config = GuestConfig {
            participant: PeerId::from(id),
            policy: self.policy.clone(),
        };
        let mut guest = Guest::new(config, self.registry.clone());
        guest.start();
        self.guests.insert(id.to_string(), TestGuest { guest, probe });
        self
    }

    pub fn guest(&self, id: &str) -> &Guest {
        &self.entry(id).guest
    }

    pub fn guest_mut(&mut self, id: &str) -> &mut Guest {
        &mut self.entry_mut(id).guest
    }

    pub fn probe(&self, id: &str) -> &ChannelProbe {
        &self.entry(id).probe
    }

    pub fn guest_ids(&self) -> Vec<String> {
        self.guests.keys().cloned().collect()
    }

    /// Queue a command on `id`'s outgoing buffer
    pub fn send(&mut self, id: &str, kind: &str, body: Value) {
        self.guest_mut(id).send_command(kind, body).unwrap();
    }

    /// Send a command and run the lobby until it is quiet
    pub fn act(&mut self, id: &str, kind: &str, body: Value) {
        self.send(id, kind, body);
        self.exchange();
    }

    /// Hand every frame `id` has buffered to the host
    pub fn deliver_to_host(&mut self, id: &str) -> usize {
        let peer = PeerId::from(id);
        let frames = self.entry_mut(id).guest.take_outgoing();
        for frame in &frames {
            self.host.receive(&peer, frame);
        }
        frames.len()
    }

    /// Put `id`'s in-flight frames in front of the guest, then let the host
    /// flush whatever backpressure held back. Counts both.
    pub fn deliver_to_guest(&mut self, id: &str) -> usize {
        let entry = self.guests.get_mut(id).unwrap();
        let frames = entry.probe.deliver();
        for frame in &frames {
            entry.guest.receive(frame);
        }
        let peer = PeerId::from(id);
        let mut flushed = 0;
        if self.host.queue_len(&peer).unwrap_or(0) > 0 {
            flushed = self.host.peer_drained(&peer).unwrap_or(0);
        }
        frames.len() + flushed
    }

    /// Move frames both ways until nothing is left in flight. Returns how
    /// many frames moved.
    pub fn exchange(&mut self) -> usize {
        let mut total = 0;
        for round in 0..MAX_ROUNDS {
            let mut moved = 0;
            for id in self.guest_ids() {
                moved += self.deliver_to_host(&id);
                moved += self.deliver_to_guest(&id);
            }
            if moved == 0 {
                debug!("TestLobby: quiet after {} rounds", round);
                return total;
            }
            total += moved;
        }
        panic!("TestLobby: still exchanging after {} rounds", MAX_ROUNDS);
    }

    fn entry(&self, id: &str) -> &TestGuest {
        self.guests
            .get(id)
            .unwrap_or_else(|| panic!("no guest {}", id))
    }

    fn entry_mut(&mut self, id: &str) -> &mut TestGuest {
        self.guests
            .get_mut(id)
            .unwrap_or_else(|| panic!("no guest {}", id))
    }
}

impl Default for TestLobby {
    fn default() -> Self {
        Self::new()
    }
}
