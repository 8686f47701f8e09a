use async_trait::async_trait;

use super::error::NarrationError;

/// Turns effect descriptions into prose for the chat log.
///
/// Called from a detached task; its result re-enters the host as an
/// ordinary command and a failure changes nothing.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, lines: Vec<String>) -> Result<String, NarrationError>;
}

/// A narrator that is never available
pub struct NullNarrator;

#[async_trait]
impl Narrator for NullNarrator {
    async fn narrate(&self, _lines: Vec<String>) -> Result<String, NarrationError> {
        Err(NarrationError::Unavailable)
    }
}
