use thiserror::Error;

/// Errors that can occur while reading or writing lobby wire messages
///
/// Everything arriving over a peer channel is untrusted, so decoding never
/// panics: each failure mode maps to one of these variants and the caller
/// logs and drops the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Payload is not a JSON envelope
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// Envelope was produced by an incompatible protocol version
    #[error("Unsupported protocol version {version} (expected {expected})")]
    UnsupportedVersion { version: u32, expected: u32 },

    /// Envelope belongs to the signaling scope, not the lobby
    #[error("Envelope kind {kind} is not in the lobby scope")]
    WrongScope { kind: String },

    /// An `object:*` message whose body does not match its kind
    #[error("Malformed body for {kind}: {reason}")]
    MalformedBody { kind: String, reason: String },

    /// Failed to serialize an outgoing message (should not happen)
    #[error("Failed to encode {kind}: {reason}")]
    EncodeFailed { kind: String, reason: String },
}
