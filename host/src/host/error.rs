use thiserror::Error;

/// Errors surfaced by the host's typed API. Protocol-level drops from guests
/// are logged instead and never reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The model's object id is not in the host's registry
    #[error("No object registered for id {id}")]
    UnknownObject { id: &'static str },

    /// No channel is registered for this peer
    #[error("Peer {peer} is not connected")]
    UnknownPeer { peer: String },
}
