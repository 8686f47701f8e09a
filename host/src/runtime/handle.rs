use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use lobby_shared::PeerId;

use crate::{host::Host, peer::PeerChannel};

use super::error::RuntimeError;

/// Everything that can wake the host loop
pub enum HostInput {
    Connect {
        peer: PeerId,
        channel: Box<dyn PeerChannel>,
    },
    Disconnect {
        peer: PeerId,
    },
    Message {
        peer: PeerId,
        text: String,
    },
    /// The peer's channel drained below its low-water mark
    Drained {
        peer: PeerId,
    },
    /// A command issued by the host itself
    Command {
        kind: String,
        body: Value,
    },
    /// A scheduled command came due
    Timer {
        key: String,
        generation: u64,
        kind: String,
        body: Value,
    },
    /// A narrator finished
    Narration {
        reply_kind: String,
        text: String,
    },
    Inspect(Box<dyn FnOnce(&Host) + Send>),
    Shutdown,
}

/// Cloneable sender into a running [`HostRuntime`](super::HostRuntime).
#[derive(Clone)]
pub struct HostHandle {
    sender: mpsc::UnboundedSender<HostInput>,
}

impl HostHandle {
    pub(crate) fn new(sender: mpsc::UnboundedSender<HostInput>) -> Self {
        Self { sender }
    }

    pub fn send(&self, input: HostInput) -> Result<(), RuntimeError> {
        self.sender.send(input).map_err(|_| RuntimeError::Stopped)
    }

    pub fn connect(&self, peer: PeerId, channel: Box<dyn PeerChannel>) -> Result<(), RuntimeError> {
        self.send(HostInput::Connect { peer, channel })
    }

    pub fn disconnect(&self, peer: PeerId) -> Result<(), RuntimeError> {
        self.send(HostInput::Disconnect { peer })
    }

    pub fn message(&self, peer: PeerId, text: String) -> Result<(), RuntimeError> {
        self.send(HostInput::Message { peer, text })
    }

    pub fn drained(&self, peer: PeerId) -> Result<(), RuntimeError> {
        self.send(HostInput::Drained { peer })
    }

    pub fn command(&self, kind: impl Into<String>, body: Value) -> Result<(), RuntimeError> {
        self.send(HostInput::Command {
            kind: kind.into(),
            body,
        })
    }

    /// Read host state between inputs
    pub async fn inspect<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        R: Send + 'static,
        F: FnOnce(&Host) -> R + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.send(HostInput::Inspect(Box::new(move |host| {
            let _ = reply.send(f(host));
        })))?;
        response.await.map_err(|_| RuntimeError::Stopped)
    }

    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(HostInput::Shutdown)
    }
}
