//! Transport abstraction layer for Emberlink.
//!
//! Provides the [`Connection`] trait: a bidirectional byte stream to the
//! game server. The protocol layer above it cuts the stream into frames;
//! the transport never looks inside.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP transport via `tokio::net`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::TcpConnection;

use std::net::SocketAddr;

/// A single connection that can send and receive raw bytes.
///
/// Reads return whatever the network delivered: zero, one, or many
/// protocol frames, possibly cut mid-frame. Reassembly is the caller's
/// job.
pub trait Connection: 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes all of `data` to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next chunk of bytes from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly.
    /// Must be cancel-safe: dropping the future before it completes loses
    /// no data.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection. Further sends fail; calling it twice is a
    /// no-op.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;

    /// Address of the remote peer.
    fn peer_addr(&self) -> SocketAddr;
}
