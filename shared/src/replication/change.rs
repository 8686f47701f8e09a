use serde_json::Value;

use crate::{patch::PatchOp, types::Revision, wire::ObjectMessage};

#[derive(Clone, Debug, PartialEq)]
pub enum ChangePayload {
    Replace(Value),
    Patch(Vec<PatchOp>),
}

/// One accepted mutation of a replicated object, ready to broadcast
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub id: &'static str,
    pub revision: Revision,
    pub payload: ChangePayload,
}

impl Change {
    pub fn is_patch(&self) -> bool {
        matches!(self.payload, ChangePayload::Patch(_))
    }

    pub fn to_message(&self) -> ObjectMessage {
        match &self.payload {
            ChangePayload::Replace(value) => ObjectMessage::Replace {
                id: self.id.to_string(),
                rev: self.revision,
                value: value.clone(),
            },
            ChangePayload::Patch(ops) => ObjectMessage::Patch {
                id: self.id.to_string(),
                rev: self.revision,
                ops: ops.clone(),
            },
        }
    }
}
