//! Unified error type for the Emberlink client.

use emberlink_protocol::ProtocolError;
use emberlink_session::SessionError;
use emberlink_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors, so the
/// client loop and applications deal with a single type.
#[derive(Debug, thiserror::Error)]
pub enum EmberlinkError {
    /// Connecting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame couldn't be encoded or decoded. The stream is unusable
    /// after this.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The handshake failed (version mismatch, refused login).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A command was sent through a [`ClientHandle`](crate::ClientHandle)
    /// after the client's event loop exited.
    #[error("client event loop is no longer running")]
    ClientGone,
}
