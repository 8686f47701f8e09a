use std::collections::HashMap;

use log::{info, warn};

use lobby_shared::{PeerId, SyncPolicy};

use super::{
    channel::PeerChannel,
    send_queue::{PeerSendQueue, SendOutcome},
};

/// One [`PeerSendQueue`] per connected guest.
#[derive(Default)]
pub struct PeerQueues {
    queues: HashMap<PeerId, PeerSendQueue>,
}

impl PeerQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer's channel. A reconnecting peer gets a fresh queue;
    /// whatever was pending for the old channel is discarded.
    pub fn add(&mut self, peer: PeerId, channel: Box<dyn PeerChannel>) {
        if self.queues.contains_key(&peer) {
            info!("Peer {} reconnected, discarding its old queue", peer);
        }
        self.queues.insert(peer, PeerSendQueue::new(channel));
    }

    pub fn remove(&mut self, peer: &PeerId) -> bool {
        self.queues.remove(peer).is_some()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.queues.contains_key(peer)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.queues.keys()
    }

    pub fn send_to(&mut self, peer: &PeerId, text: String, policy: &SyncPolicy) -> SendOutcome {
        match self.queues.get_mut(peer) {
            Some(queue) => queue.send(text, policy),
            None => {
                warn!("No channel for peer {}, dropping message", peer);
                SendOutcome::Dropped
            }
        }
    }

    /// Send `text` to every peer
    pub fn broadcast(&mut self, text: &str, policy: &SyncPolicy) {
        for queue in self.queues.values_mut() {
            queue.send(text.to_string(), policy);
        }
    }

    pub fn flush(&mut self, peer: &PeerId, policy: &SyncPolicy) -> Option<usize> {
        self.queues.get_mut(peer).map(|queue| queue.flush(policy))
    }

    pub fn pending_len(&self, peer: &PeerId) -> Option<usize> {
        self.queues.get(peer).map(PeerSendQueue::pending_len)
    }

    pub fn dropped(&self, peer: &PeerId) -> Option<u64> {
        self.queues.get(peer).map(PeerSendQueue::dropped)
    }
}
