use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use lobby_shared::{PeerId, Revision};

#[derive(Default)]
struct AckState {
    sent: Revision,
    acked: Option<Revision>,
    behind_since: Option<Instant>,
    last_recovery: Option<Instant>,
}

impl AckState {
    fn is_behind(&self) -> bool {
        self.acked.map_or(true, |acked| acked < self.sent)
    }
}

/// Last revision each peer confirmed for each object. Acks never gate
/// sending; they only reveal peers whose replicas stopped advancing.
#[derive(Default)]
pub struct AckTracker {
    peers: HashMap<PeerId, HashMap<&'static str, AckState>>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_sent(&mut self, peer: &PeerId, id: &'static str, revision: Revision, now: Instant) {
        let state = self.state_mut(peer, id);
        state.sent = state.sent.max(revision);
        if state.is_behind() && state.behind_since.is_none() {
            state.behind_since = Some(now);
        }
    }

    pub fn on_ack(&mut self, peer: &PeerId, id: &'static str, revision: Revision, now: Instant) {
        let state = self.state_mut(peer, id);
        let advanced = state.acked.map_or(true, |acked| revision > acked);
        if !advanced {
            return;
        }
        state.acked = Some(revision);
        state.behind_since = if state.is_behind() { Some(now) } else { None };
    }

    pub fn acked(&self, peer: &PeerId, id: &str) -> Option<Revision> {
        self.peers.get(peer)?.get(id)?.acked
    }

    pub fn remove_peer(&mut self, peer: &PeerId) {
        self.peers.remove(peer);
    }

    /// Peers whose ack has trailed for longer than `timeout`, at most once
    /// per `backoff` for each (peer, object)
    pub fn stalled(
        &mut self,
        now: Instant,
        timeout: Duration,
        backoff: Duration,
    ) -> Vec<(PeerId, &'static str)> {
        let mut stalled = Vec::new();
        for (peer, objects) in self.peers.iter_mut() {
            for (id, state) in objects.iter_mut() {
                let Some(since) = state.behind_since else {
                    continue;
                };
                if !state.is_behind() || now.saturating_duration_since(since) < timeout {
                    continue;
                }
                if let Some(last) = state.last_recovery {
                    if now.saturating_duration_since(last) < backoff {
                        continue;
                    }
                }
                state.last_recovery = Some(now);
                state.behind_since = Some(now);
                stalled.push((peer.clone(), *id));
            }
        }
        stalled
    }

    fn state_mut(&mut self, peer: &PeerId, id: &'static str) -> &mut AckState {
        self.peers
            .entry(peer.clone())
            .or_default()
            .entry(id)
            .or_default()
    }
}
