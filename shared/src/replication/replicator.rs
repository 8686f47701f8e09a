use std::any::Any;

use log::{debug, warn};
use serde_json::Value;

use crate::{
    patch::{apply_ops, PatchOp},
    policy::SyncPolicy,
    sync_model::{CommandContext, Outcome, SyncModel},
    types::Revision,
    wire::ObjectMessage,
};

use super::{
    change::{Change, ChangePayload},
    replicated_object::{DispatchStatus, Dispatched, ReplicatedObject},
};

/// The authoritative instance of one object, living only on the host.
///
/// `wire` always holds `M::serialize(&state)` so diffs are computed against
/// exactly what guests were sent.
pub struct Replicator<M: SyncModel> {
    state: M::State,
    revision: Revision,
    wire: Value,
}

impl<M: SyncModel> Replicator<M> {
    pub fn new() -> Self {
        let state = M::initial();
        let wire = M::serialize(&state);
        Self {
            state,
            revision: 0,
            wire,
        }
    }

    pub fn get(&self) -> &M::State {
        &self.state
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Commit `next`. Returns `None`, without bumping the revision, when it
    /// equals the current state.
    pub fn set(&mut self, next: M::State, policy: &SyncPolicy) -> Option<Change> {
        if next == self.state {
            return None;
        }
        let wire = M::serialize(&next);
        let payload = self.encode(&wire, policy);

        self.state = next;
        self.wire = wire;
        self.revision += 1;

        Some(Change {
            id: M::ID,
            revision: self.revision,
            payload,
        })
    }

    /// Run `reducer` on a copy of the state and commit the result.
    pub fn update(
        &mut self,
        reducer: impl FnOnce(&mut M::State),
        policy: &SyncPolicy,
    ) -> Option<Change> {
        let mut next = self.state.clone();
        reducer(&mut next);
        self.set(next, policy)
    }

    fn encode(&self, next: &Value, policy: &SyncPolicy) -> ChangePayload {
        let Some(ops) = M::diff(&self.wire, next) else {
            return ChangePayload::Replace(next.clone());
        };
        if ops.len() > M::INCREMENTAL_MAX {
            debug!(
                "{}: {} ops exceed the incremental cap of {}, sending replace",
                M::ID,
                ops.len(),
                M::INCREMENTAL_MAX
            );
            return ChangePayload::Replace(next.clone());
        }
        let ops_bytes = ops_size(&ops);
        if ops_bytes > policy.snapshot_compression_threshold_bytes {
            debug!(
                "{}: patch of {} bytes exceeds the snapshot threshold, sending replace",
                M::ID,
                ops_bytes
            );
            return ChangePayload::Replace(next.clone());
        }
        match apply_ops(&self.wire, &ops) {
            Ok(patched) if patched == *next => ChangePayload::Patch(ops),
            Ok(_) => {
                warn!("{}: diff does not reproduce the new state, sending replace", M::ID);
                ChangePayload::Replace(next.clone())
            }
            Err(err) => {
                warn!("{}: diff does not apply ({}), sending replace", M::ID, err);
                ChangePayload::Replace(next.clone())
            }
        }
    }
}

impl<M: SyncModel> Default for Replicator<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn ops_size(ops: &[PatchOp]) -> usize {
    serde_json::to_vec(ops)
        .map(|bytes| bytes.len())
        .unwrap_or(usize::MAX)
}

impl<M: SyncModel> ReplicatedObject for Replicator<M> {
    fn id(&self) -> &'static str {
        M::ID
    }

    fn revision(&self) -> Revision {
        self.revision
    }

    fn snapshot(&self) -> &Value {
        &self.wire
    }

    fn replace_message(&self) -> ObjectMessage {
        ObjectMessage::Replace {
            id: M::ID.to_string(),
            rev: self.revision,
            value: self.wire.clone(),
        }
    }

    fn state_any(&self) -> &dyn Any {
        &self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn dispatch(&mut self, kind: &str, body: &Value, ctx: &CommandContext<'_>) -> Dispatched {
        let Some(command) = M::parse(kind, body) else {
            return Dispatched::rejected(DispatchStatus::Malformed);
        };
        if !M::authorize(ctx, &self.state, &command) {
            return Dispatched::rejected(DispatchStatus::Unauthorized);
        }

        let Outcome { next, effects } = M::handle(ctx, &self.state, command);
        let change = next.and_then(|next| self.set(next, ctx.policy));
        let status = if change.is_some() || !effects.is_empty() {
            DispatchStatus::Applied
        } else {
            DispatchStatus::Unchanged
        };

        Dispatched {
            status,
            change,
            effects,
        }
    }
}
