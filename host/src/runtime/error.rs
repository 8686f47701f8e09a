use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrationError {
    /// No narrator is configured
    #[error("Narrator unavailable")]
    Unavailable,

    #[error("Narration failed: {reason}")]
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The runtime loop has exited
    #[error("Host runtime has stopped")]
    Stopped,
}
