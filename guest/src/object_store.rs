use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};
use serde_json::Value;

use lobby_shared::{apply_ops, PatchOp, Registry, Revision};

/// A guest's replica of one shared object
#[derive(Clone, Debug, PartialEq)]
pub struct ClientObjectState {
    pub rev: Revision,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchResult {
    Applied,
    /// No replica to patch yet
    Missing,
    /// Revision is not exactly current + 1
    Stale,
    /// Ops failed to apply, or produced a value the model rejects
    Invalid,
}

impl PatchResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchResult::Applied)
    }
}

/// Read-only replicas of the host's objects, gated by revision.
///
/// Nothing here is trusted: every incoming value must deserialize into the
/// registered model's state before it replaces the cached one, and a patch
/// is applied to a copy so a failure leaves the replica untouched.
pub struct ObjectStore {
    registry: Arc<Registry>,
    objects: HashMap<String, ClientObjectState>,
}

impl ObjectStore {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            objects: HashMap::new(),
        }
    }

    /// Accept a snapshot iff `rev` is newer than the replica
    pub fn apply_replace(&mut self, id: &str, rev: Revision, value: Value) -> bool {
        let entry = match self.registry.entry(id) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("ObjectStore: replace ignored: {}", err);
                return false;
            }
        };
        if let Some(current) = self.objects.get(id) {
            if rev <= current.rev {
                debug!(
                    "ObjectStore: stale replace of {} (rev {}, have {})",
                    id, rev, current.rev
                );
                return false;
            }
        }
        if !entry.validate(&value) {
            warn!("ObjectStore: replace of {} rev {} failed validation", id, rev);
            return false;
        }

        self.objects
            .insert(id.to_string(), ClientObjectState { rev, value });
        true
    }

    pub fn apply_patch(&mut self, id: &str, rev: Revision, ops: &[PatchOp]) -> PatchResult {
        let Some(current) = self.objects.get(id) else {
            debug!("ObjectStore: patch for {} before any snapshot", id);
            return PatchResult::Missing;
        };
        if current.rev.checked_add(1) != Some(rev) {
            debug!(
                "ObjectStore: stale patch of {} (rev {}, have {})",
                id, rev, current.rev
            );
            return PatchResult::Stale;
        }

        let value = match apply_ops(&current.value, ops) {
            Ok(value) => value,
            Err(err) => {
                warn!("ObjectStore: patch of {} rev {} rejected: {}", id, rev, err);
                return PatchResult::Invalid;
            }
        };
        let valid = self
            .registry
            .entry(id)
            .map(|entry| entry.validate(&value))
            .unwrap_or(false);
        if !valid {
            warn!("ObjectStore: patch of {} rev {} failed validation", id, rev);
            return PatchResult::Invalid;
        }

        self.objects
            .insert(id.to_string(), ClientObjectState { rev, value });
        PatchResult::Applied
    }

    pub fn get(&self, id: &str) -> Option<&ClientObjectState> {
        self.objects.get(id)
    }

    pub fn revision(&self, id: &str) -> Option<Revision> {
        self.objects.get(id).map(|state| state.rev)
    }

    pub fn value(&self, id: &str) -> Option<&Value> {
        self.objects.get(id).map(|state| &state.value)
    }

    /// Forget every replica
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
