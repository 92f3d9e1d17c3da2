//! Error types for the protocol layer.
//!
//! Each crate in Emberlink defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in framing or
//! (de)serialization, not in networking or session handling.

/// Errors that can occur in the protocol layer.
///
/// A decode error is never recoverable at the connection level: once a
/// payload fails to parse, the frame boundaries after it cannot be
/// trusted, so the caller must close the connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Binary serialization failed (turning a message into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] bincode::Error),

    /// Binary deserialization failed.
    ///
    /// Common causes: an unknown message or state-value discriminant,
    /// a truncated payload (a required field is missing), or trailing
    /// garbage after the message.
    #[error("decode failed: {0}")]
    Decode(#[source] bincode::Error),

    /// JSON serialization failed (debug codec).
    #[cfg(feature = "json")]
    #[error("json encode failed: {0}")]
    JsonEncode(#[source] serde_json::Error),

    /// JSON deserialization failed (debug codec).
    #[cfg(feature = "json")]
    #[error("json decode failed: {0}")]
    JsonDecode(#[source] serde_json::Error),

    /// A payload does not fit the 2-byte length prefix.
    #[error("frame payload of {len} bytes exceeds the 65535-byte limit")]
    FrameTooLarge {
        /// Length of the rejected payload.
        len: usize,
    },
}
