//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding control messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// unknown `op`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but is invalid in its current context —
    /// e.g. a `room.leave` from a connection that never attached.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
