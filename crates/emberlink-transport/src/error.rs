/// Failures of the byte stream underneath a session.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server could not be resolved or refused the connection.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Used after this side already closed the stream.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame to the socket failed.
    #[error("write to server failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the socket failed (reset, not a clean EOF).
    #[error("read from server failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
