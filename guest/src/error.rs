use thiserror::Error;

use lobby_shared::WireError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestError {
    /// No registered model handles this command kind
    #[error("No model handles command {kind}")]
    UnknownCommand { kind: String },

    /// No registered model has this object id
    #[error("No object registered for id {id}")]
    UnknownObject { id: String },

    #[error(transparent)]
    Wire(#[from] WireError),
}
