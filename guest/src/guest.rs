use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Instant,
};

use log::{debug, info, warn};
use serde_json::Value;

use lobby_shared::{
    Envelope, ObjectMessage, ParticipantId, PatchOp, Registry, Revision, SyncModel,
};

use crate::{
    error::GuestError,
    guest_config::GuestConfig,
    object_store::{ObjectStore, PatchResult},
};

/// Something that changed in the guest's replicas
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuestEvent {
    Replaced { id: String, rev: Revision },
    Patched { id: String, rev: Revision },
    /// A patch was refused and a fresh snapshot was requested
    Resync { id: String, reason: PatchResult },
}

/// A lobby guest.
///
/// Holds read-only replicas of the host's objects and turns incoming
/// replication traffic into replica updates, acks and resync requests.
/// Outgoing frames are buffered for the caller to put on the channel, see
/// [`Guest::take_outgoing`].
pub struct Guest {
    config: GuestConfig,
    registry: Arc<Registry>,
    store: ObjectStore,
    outgoing: VecDeque<String>,
    events: Vec<GuestEvent>,
    /// Last resync request per object, cleared once a snapshot lands
    resyncing: HashMap<String, Instant>,
}

impl Guest {
    pub fn new(config: GuestConfig, registry: Arc<Registry>) -> Self {
        Self {
            store: ObjectStore::new(registry.clone()),
            config,
            registry,
            outgoing: VecDeque::new(),
            events: Vec::new(),
            resyncing: HashMap::new(),
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.config.participant
    }

    /// Ask for every object whose model wants a snapshot on start. Returns
    /// how many were requested.
    pub fn start(&mut self) -> usize {
        let ids: Vec<&'static str> = self
            .registry
            .entries()
            .filter(|entry| entry.request_on_start())
            .map(|entry| entry.id())
            .collect();
        for id in &ids {
            self.push(ObjectMessage::Request {
                id: id.to_string(),
                since_rev: self.store.revision(id),
            });
        }
        info!("Guest {} requested {} objects", self.config.participant, ids.len());
        ids.len()
    }

    /// Start over against a new host session: replicas, pending frames and
    /// resync pacing are dropped, then every object is requested afresh.
    /// Returns how many were requested.
    pub fn reconnect(&mut self) -> usize {
        info!("Guest {} reconnecting, dropping replicas", self.config.participant);
        self.store.clear();
        self.outgoing.clear();
        self.resyncing.clear();
        self.start()
    }

    // Outgoing

    pub fn send_command(&mut self, kind: &str, body: Value) -> Result<(), GuestError> {
        if self.registry.model_for_command(kind).is_none() {
            return Err(GuestError::UnknownCommand {
                kind: kind.to_string(),
            });
        }
        let text = Envelope::lobby(kind, body).encode()?;
        self.outgoing.push_back(text);
        Ok(())
    }

    /// Request a fresh snapshot of `id`
    pub fn request(&mut self, id: &str) -> Result<(), GuestError> {
        if !self.registry.contains(id) {
            return Err(GuestError::UnknownObject { id: id.to_string() });
        }
        self.push(ObjectMessage::Request {
            id: id.to_string(),
            since_rev: self.store.revision(id),
        });
        Ok(())
    }

    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.outgoing.drain(..).collect()
    }

    pub fn take_events(&mut self) -> Vec<GuestEvent> {
        std::mem::take(&mut self.events)
    }

    fn push(&mut self, message: ObjectMessage) {
        match message.encode() {
            Ok(text) => self.outgoing.push_back(text),
            Err(err) => warn!("Guest: cannot encode {}: {}", message.kind(), err),
        }
    }

    // Incoming

    pub fn receive(&mut self, text: &str) -> bool {
        self.receive_at(text, Instant::now())
    }

    /// Handle one frame from the host. Returns true if a replica changed.
    pub fn receive_at(&mut self, text: &str, now: Instant) -> bool {
        let message = match Envelope::decode(text)
            .and_then(|envelope| ObjectMessage::from_envelope(&envelope))
        {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("Guest: ignoring non-replication frame");
                return false;
            }
            Err(err) => {
                warn!("Guest: dropping frame: {}", err);
                return false;
            }
        };

        match message {
            ObjectMessage::Replace { id, rev, value } => self.on_replace(id, rev, value),
            ObjectMessage::Patch { id, rev, ops } => self.on_patch(id, rev, &ops, now),
            message => {
                warn!("Guest: host sent guest-only {}", message.kind());
                false
            }
        }
    }

    fn on_replace(&mut self, id: String, rev: Revision, value: Value) -> bool {
        if !self.store.apply_replace(&id, rev, value) {
            return false;
        }
        self.resyncing.remove(&id);
        self.ack(&id, rev);
        self.events.push(GuestEvent::Replaced { id, rev });
        true
    }

    fn on_patch(&mut self, id: String, rev: Revision, ops: &[PatchOp], now: Instant) -> bool {
        if !self.registry.contains(&id) {
            debug!("Guest: patch for unknown object {}", id);
            return false;
        }
        match self.store.apply_patch(&id, rev, ops) {
            PatchResult::Applied => {
                self.ack(&id, rev);
                self.events.push(GuestEvent::Patched { id, rev });
                true
            }
            reason => {
                self.resync(id, reason, now);
                false
            }
        }
    }

    fn ack(&mut self, id: &str, rev: Revision) {
        self.push(ObjectMessage::Ack {
            id: id.to_string(),
            rev,
        });
    }

    /// Request a snapshot unless one was asked for within the ack backoff
    fn resync(&mut self, id: String, reason: PatchResult, now: Instant) {
        if let Some(last) = self.resyncing.get(&id) {
            if now.saturating_duration_since(*last) < self.config.policy.ack_backoff() {
                debug!("Guest: resync of {} already pending", id);
                return;
            }
        }
        info!("Guest: resyncing {} ({:?})", id, reason);
        self.push(ObjectMessage::Request {
            id: id.clone(),
            since_rev: self.store.revision(&id),
        });
        self.resyncing.insert(id.clone(), now);
        self.events.push(GuestEvent::Resync { id, reason });
    }

    // Replicas

    /// The replica of `M`, if one has arrived
    pub fn get<M: SyncModel>(&self) -> Option<M::State> {
        self.store.value(M::ID).and_then(M::deserialize)
    }

    pub fn revision(&self, id: &str) -> Option<Revision> {
        self.store.revision(id)
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }
}
