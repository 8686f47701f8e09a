use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{patch::PatchOp, types::Revision};

use super::{envelope::Envelope, error::WireError};

pub const OBJECT_REPLACE_KIND: &str = "object:replace";
pub const OBJECT_PATCH_KIND: &str = "object:patch";
pub const OBJECT_REQUEST_KIND: &str = "object:request";
pub const OBJECT_ACK_KIND: &str = "object:ack";

/// Replication traffic for one shared object
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectMessage {
    /// Full snapshot, host → guest
    Replace {
        id: String,
        rev: Revision,
        value: Value,
    },
    /// Incremental ops taking a replica from `rev - 1` to `rev`, host → guest
    Patch {
        id: String,
        rev: Revision,
        ops: Vec<PatchOp>,
    },
    /// Guest asks for a fresh snapshot
    Request {
        id: String,
        since_rev: Option<Revision>,
    },
    /// Guest confirms it applied `rev`
    Ack { id: String, rev: Revision },
}

#[derive(Serialize, Deserialize)]
struct ReplaceBody {
    id: String,
    rev: Revision,
    value: Value,
}

#[derive(Serialize, Deserialize)]
struct PatchBody {
    id: String,
    rev: Revision,
    ops: Vec<PatchOp>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    since_rev: Option<Revision>,
}

#[derive(Serialize, Deserialize)]
struct AckBody {
    id: String,
    rev: Revision,
}

impl ObjectMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ObjectMessage::Replace { .. } => OBJECT_REPLACE_KIND,
            ObjectMessage::Patch { .. } => OBJECT_PATCH_KIND,
            ObjectMessage::Request { .. } => OBJECT_REQUEST_KIND,
            ObjectMessage::Ack { .. } => OBJECT_ACK_KIND,
        }
    }

    pub fn object_id(&self) -> &str {
        match self {
            ObjectMessage::Replace { id, .. }
            | ObjectMessage::Patch { id, .. }
            | ObjectMessage::Request { id, .. }
            | ObjectMessage::Ack { id, .. } => id,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, WireError> {
        let body = match self.clone() {
            ObjectMessage::Replace { id, rev, value } => {
                serde_json::to_value(ReplaceBody { id, rev, value })
            }
            ObjectMessage::Patch { id, rev, ops } => {
                serde_json::to_value(PatchBody { id, rev, ops })
            }
            ObjectMessage::Request { id, since_rev } => {
                serde_json::to_value(RequestBody { id, since_rev })
            }
            ObjectMessage::Ack { id, rev } => serde_json::to_value(AckBody { id, rev }),
        }
        .map_err(|err| WireError::EncodeFailed {
            kind: self.kind().to_string(),
            reason: err.to_string(),
        })?;

        Ok(Envelope::lobby(self.kind(), body))
    }

    pub fn encode(&self) -> Result<String, WireError> {
        self.to_envelope()?.encode()
    }

    /// Returns `Ok(None)` when the envelope is not replication traffic
    /// (i.e. it is a feature command).
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<Self>, WireError> {
        let message = match envelope.kind.as_str() {
            OBJECT_REPLACE_KIND => {
                let ReplaceBody { id, rev, value } = read_body(envelope)?;
                ObjectMessage::Replace { id, rev, value }
            }
            OBJECT_PATCH_KIND => {
                let PatchBody { id, rev, ops } = read_body(envelope)?;
                ObjectMessage::Patch { id, rev, ops }
            }
            OBJECT_REQUEST_KIND => {
                let RequestBody { id, since_rev } = read_body(envelope)?;
                ObjectMessage::Request { id, since_rev }
            }
            OBJECT_ACK_KIND => {
                let AckBody { id, rev } = read_body(envelope)?;
                ObjectMessage::Ack { id, rev }
            }
            _ => return Ok(None),
        };
        Ok(Some(message))
    }
}

fn read_body<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, WireError> {
    T::deserialize(&envelope.body).map_err(|err| WireError::MalformedBody {
        kind: envelope.kind.clone(),
        reason: err.to_string(),
    })
}
