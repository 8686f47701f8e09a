use thiserror::Error;

/// Errors that can occur while registering or looking up sync models
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A different model type is already registered under this object id
    #[error("Object id {id} is already registered by {existing}, cannot register {incoming}")]
    DuplicateObject {
        id: &'static str,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Two models claim the same command kind
    #[error("Command kind {kind} is already handled by object {owner}, cannot add it to {incoming}")]
    DuplicateCommand {
        kind: &'static str,
        owner: &'static str,
        incoming: &'static str,
    },

    /// No model is registered under this object id
    #[error("No sync model registered for object id {id}")]
    UnknownModel { id: String },
}
