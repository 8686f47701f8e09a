use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::WireError;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Signal,
    Lobby,
}

/// The JSON frame every lobby message travels in
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub scope: Scope,
    pub version: u32,
    pub kind: String,
    #[serde(default)]
    pub body: Value,
}

impl Envelope {
    pub fn lobby(kind: impl Into<String>, body: Value) -> Self {
        Self {
            scope: Scope::Lobby,
            version: PROTOCOL_VERSION,
            kind: kind.into(),
            body,
        }
    }

    pub fn encode(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(|err| WireError::EncodeFailed {
            kind: self.kind.clone(),
            reason: err.to_string(),
        })
    }

    /// Parse a lobby envelope, rejecting other protocol versions and the
    /// signaling scope (connection setup is handled outside the lobby).
    pub fn decode(text: &str) -> Result<Self, WireError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|err| WireError::MalformedEnvelope {
                reason: err.to_string(),
            })?;

        if envelope.version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion {
                version: envelope.version,
                expected: PROTOCOL_VERSION,
            });
        }
        if envelope.scope != Scope::Lobby {
            return Err(WireError::WrongScope {
                kind: envelope.kind,
            });
        }

        Ok(envelope)
    }
}
