use std::{collections::VecDeque, sync::Arc, time::Instant};

use log::{debug, info, warn};
use serde_json::{json, Value};

use lobby_shared::{
    models::roster, wire::OBJECT_REQUEST_KIND, Actor, Change, CommandContext, Content,
    DispatchStatus, Envelope, ObjectMessage, ObjectsView, PeerId, PolicyError,
    PolicyStore, Registry, ReplicatedObject, Replicator, Revision, SyncModel, SyncPolicy,
    Timestamp,
};

use crate::{
    ack_tracker::AckTracker,
    peer::{PeerChannel, PeerQueues},
    rate_limiter::RateLimits,
};

use super::{
    error::HostError,
    host_config::HostConfig,
    host_effect::{HostEffect, Routed},
};

/// The authoritative lobby participant.
///
/// Owns the only writable instance of every registered object, runs guest
/// commands one at a time to completion, and replicates each accepted
/// change to every connected guest. Side effects requested by handlers are
/// collected for the runtime; see [`Host::take_effects`].
pub struct Host {
    config: HostConfig,
    actor: Actor,
    registry: Arc<Registry>,
    content: Arc<dyn Content>,
    policy: PolicyStore,
    objects: Vec<Box<dyn ReplicatedObject>>,
    peers: PeerQueues,
    limits: RateLimits,
    limits_generation: u64,
    acks: AckTracker,
    effects: Vec<HostEffect>,
}

impl Host {
    pub fn new(config: HostConfig, registry: Arc<Registry>, content: Arc<dyn Content>) -> Self {
        let objects: Vec<Box<dyn ReplicatedObject>> =
            registry.entries().map(|entry| entry.spawn()).collect();
        let policy = PolicyStore::new(config.policy.clone());
        let limits = RateLimits::from_policy(&policy.snapshot());
        let limits_generation = policy.generation();
        let actor = Actor::Host(config.participant.clone());

        info!("Host {} started with {} objects", config.participant, objects.len());

        let mut host = Self {
            config,
            actor,
            registry,
            content,
            policy,
            objects,
            peers: PeerQueues::new(),
            limits,
            limits_generation,
            acks: AckTracker::new(),
            effects: Vec::new(),
        };

        if host.registry.model_for_command(roster::JOIN_KIND).is_some() {
            let body = json!({
                "id": host.config.participant.as_str(),
                "name": host.config.display_name,
                "host": true,
            });
            host.command(roster::JOIN_KIND, body);
        }

        host
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    // Peers

    pub fn connect_peer(&mut self, peer: PeerId, channel: Box<dyn PeerChannel>) {
        info!("Host: peer {} connected", peer);
        self.acks.remove_peer(&peer);
        self.peers.add(peer, channel);
    }

    pub fn disconnect_peer(&mut self, peer: &PeerId) -> Result<(), HostError> {
        self.acks.remove_peer(peer);
        if !self.peers.remove(peer) {
            return Err(HostError::UnknownPeer {
                peer: peer.to_string(),
            });
        }
        info!("Host: peer {} disconnected", peer);
        Ok(())
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    /// The peer's channel drained below its low-water mark
    pub fn peer_drained(&mut self, peer: &PeerId) -> Result<usize, HostError> {
        let policy = self.policy.snapshot();
        self.peers
            .flush(peer, &policy)
            .ok_or_else(|| HostError::UnknownPeer {
                peer: peer.to_string(),
            })
    }

    pub fn queue_len(&self, peer: &PeerId) -> Option<usize> {
        self.peers.pending_len(peer)
    }

    pub fn dropped(&self, peer: &PeerId) -> Option<u64> {
        self.peers.dropped(peer)
    }

    // Incoming

    pub fn receive(&mut self, peer: &PeerId, text: &str) -> bool {
        self.receive_at(peer, text, Instant::now())
    }

    /// Handle one message from a guest. Returns true if it changed state or
    /// was answered; every drop is logged and returns false.
    pub fn receive_at(&mut self, peer: &PeerId, text: &str, now: Instant) -> bool {
        if !self.peers.contains(peer) {
            warn!("Host: message from unknown peer {}", peer);
            return false;
        }
        self.sync_limits();
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("Host: dropping message from {}: {}", peer, err);
                return false;
            }
        };

        match ObjectMessage::from_envelope(&envelope) {
            Err(err) => {
                warn!("Host: dropping message from {}: {}", peer, err);
                false
            }
            Ok(Some(ObjectMessage::Request { id, since_rev })) => {
                if !self.limits.allow_at(OBJECT_REQUEST_KIND, peer.as_str(), now) {
                    warn!("Host: rate limited {} from {}", OBJECT_REQUEST_KIND, peer);
                    return false;
                }
                debug!("Host: {} requests {} (has {:?})", peer, id, since_rev);
                self.send_snapshot(peer, &id, now)
            }
            Ok(Some(ObjectMessage::Ack { id, rev })) => {
                match self.registry.entry(&id) {
                    Ok(entry) => self.acks.on_ack(peer, entry.id(), rev, now),
                    Err(err) => debug!("Host: ack from {}: {}", peer, err),
                }
                false
            }
            Ok(Some(message)) => {
                warn!("Host: guest {} sent host-only {}", peer, message.kind());
                false
            }
            Ok(None) => {
                if !self.limits.allow_at(&envelope.kind, peer.as_str(), now) {
                    warn!("Host: rate limited {} from {}", envelope.kind, peer);
                    return false;
                }
                let actor = Actor::Guest(peer.clone());
                self.run_command(&actor, &envelope.kind, &envelope.body, now)
            }
        }
    }

    /// Run a command as the host itself. Never rate limited.
    pub fn command(&mut self, kind: &str, body: Value) -> bool {
        self.command_at(kind, body, Instant::now())
    }

    pub fn command_at(&mut self, kind: &str, body: Value, now: Instant) -> bool {
        let actor = self.actor.clone();
        self.run_command(&actor, kind, &body, now)
    }

    /// Dispatch `kind`, then any follow-up commands its handlers asked for,
    /// before returning. Returns whether the first command applied.
    fn run_command(&mut self, actor: &Actor, kind: &str, body: &Value, now: Instant) -> bool {
        let mut followups = VecDeque::new();
        let applied = self.dispatch(actor, kind, body, now, &mut followups);

        while let Some((kind, body)) = followups.pop_front() {
            let actor = self.actor.clone();
            self.dispatch(&actor, &kind, &body, now, &mut followups);
        }

        applied
    }

    fn dispatch(
        &mut self,
        actor: &Actor,
        kind: &str,
        body: &Value,
        now: Instant,
        followups: &mut VecDeque<(String, Value)>,
    ) -> bool {
        let Some(id) = self.registry.model_for_command(kind) else {
            warn!("Host: unknown command kind {} from {}", kind, actor.participant());
            return false;
        };
        let Some(index) = self.index_of(id) else {
            warn!("Host: no object {} for command {}", id, kind);
            return false;
        };

        let policy = self.policy.snapshot();
        let nonce = format!("{:016x}", fastrand::u64(..));
        let mut object = self.objects.remove(index);
        let dispatched = {
            let others = ObjectsView(&self.objects);
            let ctx = CommandContext::new(
                actor,
                Timestamp::now_millis(),
                &nonce,
                &policy,
                self.content.as_ref(),
                &others,
            );
            object.dispatch(kind, body, &ctx)
        };
        self.objects.insert(index, object);

        match dispatched.status {
            DispatchStatus::Malformed => {
                warn!("Host: malformed {} from {}", kind, actor.participant());
            }
            DispatchStatus::Unauthorized => {
                warn!("Host: unauthorized {} from {}", kind, actor.participant());
            }
            DispatchStatus::Unchanged => {
                debug!("Host: {} from {} changed nothing", kind, actor.participant());
            }
            DispatchStatus::Applied => {}
        }

        if let Some(change) = &dispatched.change {
            self.broadcast(change, &policy, now);
        }
        for effect in dispatched.effects {
            match Routed::from(effect) {
                Routed::FollowUp { kind, body } => followups.push_back((kind, body)),
                Routed::Deferred(effect) => self.effects.push(effect),
            }
        }

        dispatched.status == DispatchStatus::Applied
    }

    // Replication

    fn broadcast(&mut self, change: &Change, policy: &SyncPolicy, now: Instant) {
        let text = match change.to_message().encode() {
            Ok(text) => text,
            Err(err) => {
                warn!("Host: cannot encode change to {}: {}", change.id, err);
                return;
            }
        };
        debug!(
            "Host: {} rev {} as {}",
            change.id,
            change.revision,
            if change.is_patch() { "patch" } else { "replace" }
        );
        self.peers.broadcast(&text, policy);
        let peers: Vec<PeerId> = self.peers.peers().cloned().collect();
        for peer in peers {
            self.acks.on_sent(&peer, change.id, change.revision, now);
        }
    }

    fn send_snapshot(&mut self, peer: &PeerId, id: &str, now: Instant) -> bool {
        let Some(object) = self.objects.iter().find(|object| object.id() == id) else {
            warn!("Host: {} requested unknown object {}", peer, id);
            return false;
        };
        let (id, revision) = (object.id(), object.revision());
        let text = match object.replace_message().encode() {
            Ok(text) => text,
            Err(err) => {
                warn!("Host: cannot encode snapshot of {}: {}", id, err);
                return false;
            }
        };
        let policy = self.policy.snapshot();
        self.peers.send_to(peer, text, &policy);
        self.acks.on_sent(peer, id, revision, now);
        true
    }

    /// Send a fresh snapshot to every peer whose acks stopped advancing.
    /// Returns how many snapshots were sent.
    pub fn check_stalls(&mut self, now: Instant) -> usize {
        let policy = self.policy.snapshot();
        self.sync_limits();
        self.limits.purge(now);
        let stalled = self
            .acks
            .stalled(now, policy.patch_stall_timeout(), policy.ack_backoff());
        for (peer, id) in &stalled {
            info!("Host: {} stalled on {}, resending snapshot", peer, id);
            self.send_snapshot(peer, id, now);
        }
        stalled.len()
    }

    pub fn acked(&self, peer: &PeerId, id: &str) -> Option<Revision> {
        self.acks.acked(peer, id)
    }

    // Typed access

    pub fn get<M: SyncModel>(&self) -> Result<&M::State, HostError> {
        self.replicator::<M>().map(Replicator::get)
    }

    pub fn revision<M: SyncModel>(&self) -> Result<Revision, HostError> {
        self.replicator::<M>().map(Replicator::revision)
    }

    /// Replace `M`'s state. Returns whether anything changed.
    pub fn set<M: SyncModel>(&mut self, state: M::State) -> Result<bool, HostError> {
        let policy = self.policy.snapshot();
        let change = self.replicator_mut::<M>()?.set(state, &policy);
        Ok(self.commit(change, &policy))
    }

    /// Mutate `M`'s state in place. Returns whether anything changed.
    pub fn update<M: SyncModel>(
        &mut self,
        reducer: impl FnOnce(&mut M::State),
    ) -> Result<bool, HostError> {
        let policy = self.policy.snapshot();
        let change = self.replicator_mut::<M>()?.update(reducer, &policy);
        Ok(self.commit(change, &policy))
    }

    fn commit(&mut self, change: Option<Change>, policy: &SyncPolicy) -> bool {
        match change {
            Some(change) => {
                self.broadcast(&change, policy, Instant::now());
                true
            }
            None => false,
        }
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|object| object.id() == id)
    }

    fn replicator<M: SyncModel>(&self) -> Result<&Replicator<M>, HostError> {
        self.objects
            .iter()
            .find_map(|object| object.as_any().downcast_ref::<Replicator<M>>())
            .ok_or(HostError::UnknownObject { id: M::ID })
    }

    fn replicator_mut<M: SyncModel>(&mut self) -> Result<&mut Replicator<M>, HostError> {
        self.objects
            .iter_mut()
            .find_map(|object| object.as_any_mut().downcast_mut::<Replicator<M>>())
            .ok_or(HostError::UnknownObject { id: M::ID })
    }

    // Effects & policy

    /// Effects handlers asked for since the last call, in order
    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Tune the live policy. The change is committed only if the result
    /// validates; rate-limit buckets are then rebuilt, which resets their
    /// windows.
    pub fn update_policy(&mut self, f: impl FnOnce(&mut SyncPolicy)) -> Result<(), PolicyError> {
        if let Err(err) = self.policy.update(f) {
            warn!("Host: rejected policy update: {}", err);
            return Err(err);
        }
        self.sync_limits();
        Ok(())
    }

    /// Rebuild the rate-limit buckets if the policy store moved on, including
    /// updates made through a clone of [`Host::policy`].
    fn sync_limits(&mut self) {
        let generation = self.policy.generation();
        if generation == self.limits_generation {
            return;
        }
        info!("Host: policy generation {}, rebuilding rate limits", generation);
        self.limits = RateLimits::from_policy(&self.policy.snapshot());
        self.limits_generation = generation;
    }
}
