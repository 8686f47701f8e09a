use std::any::Any;

use serde_json::Value;

use crate::{
    sync_model::{CommandContext, Effect, StateSource},
    types::Revision,
    wire::ObjectMessage,
};

use super::change::Change;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The state changed, or the handler asked for effects
    Applied,
    /// Parsed and authorized, but the handler left everything as it was
    Unchanged,
    /// `parse` rejected the body
    Malformed,
    /// `authorize` refused the actor
    Unauthorized,
}

/// Result of running one command against an object
#[derive(Debug)]
pub struct Dispatched {
    pub status: DispatchStatus,
    pub change: Option<Change>,
    pub effects: Vec<Effect>,
}

impl Dispatched {
    pub fn rejected(status: DispatchStatus) -> Self {
        Self {
            status,
            change: None,
            effects: Vec::new(),
        }
    }

    pub fn applied(&self) -> bool {
        self.status == DispatchStatus::Applied
    }
}

/// A [`Replicator`](super::Replicator) with its model type erased, so the
/// host can keep every object in one map and route commands by kind.
pub trait ReplicatedObject: Send + Sync {
    fn id(&self) -> &'static str;
    fn revision(&self) -> Revision;
    /// Serialized current state
    fn snapshot(&self) -> &Value;
    fn replace_message(&self) -> ObjectMessage;
    /// The typed state, for cross-object reads
    fn state_any(&self) -> &dyn Any;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn dispatch(&mut self, kind: &str, body: &Value, ctx: &CommandContext<'_>) -> Dispatched;
}

/// Read-only view over a set of objects, handed to command handlers so they
/// can consult other objects' state.
pub struct ObjectsView<'a>(pub &'a [Box<dyn ReplicatedObject>]);

impl StateSource for ObjectsView<'_> {
    fn state_of(&self, id: &str) -> Option<&dyn Any> {
        self.0
            .iter()
            .find(|object| object.id() == id)
            .map(|object| object.state_any())
    }
}
