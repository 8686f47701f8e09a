use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport send failed")]
pub struct SendError;

/// An established, ordered message channel to one remote peer.
///
/// Connection setup happens elsewhere; the host only needs to know whether
/// the channel is open, how many bytes it is still holding, and how to hand
/// it a message.
pub trait PeerChannel: Send {
    fn state(&self) -> ChannelState;
    /// Bytes accepted by `send` but not yet put on the wire
    fn buffered_amount(&self) -> usize;
    fn send(&mut self, text: &str) -> Result<(), SendError>;
}
