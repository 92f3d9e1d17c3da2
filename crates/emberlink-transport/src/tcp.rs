//! TCP transport implementation using `tokio::net`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, TransportError};

/// Bytes requested from the socket per read.
const READ_CHUNK: usize = 4096;

/// A client-side TCP [`Connection`].
///
/// The stream is split so a pending read never blocks a write.
pub struct TcpConnection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl TcpConnection {
    /// Connects to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: addr.clone(),
                source,
            }
        })?;
        let conn = Self::from_stream(stream).map_err(|source| {
            TransportError::ConnectFailed { addr, source }
        })?;
        tracing::info!(peer = %conn.peer, "connected");
        Ok(conn)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> std::io::Result<Self> {
        // Input messages are tiny and latency-sensitive.
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            peer,
            closed: AtomicBool::new(false),
        })
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed(
                "send after close".into(),
            ));
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await.map_err(TransportError::SendFailed)?;
        tracing::trace!(peer = %self.peer, len = data.len(), "bytes sent");
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut buf = vec![0u8; READ_CHUNK];
        let n = self
            .reader
            .lock()
            .await
            .read(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if n == 0 {
            tracing::debug!(peer = %self.peer, "peer closed the stream");
            return Ok(None);
        }
        buf.truncate(n);
        tracing::trace!(peer = %self.peer, len = n, "bytes received");
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!(peer = %self.peer, "closing connection");
        let mut writer = self.writer.lock().await;
        match writer.shutdown().await {
            Ok(()) => Ok(()),
            // The peer may already be gone; closing is still done.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e)),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
