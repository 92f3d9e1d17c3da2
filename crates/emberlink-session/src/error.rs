//! Error types for the session layer.

use emberlink_protocol::LoginFailReason;

use crate::ConnectionState;

/// Conditions that end a session.
///
/// Anomalies that only affect a single message (an unexpected variant, a
/// duplicate entity) are logged and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server acknowledged with a protocol version we don't speak.
    #[error("protocol version mismatch: client speaks {local}, server speaks {remote}")]
    VersionMismatch { local: u32, remote: u32 },

    /// The server refused the login. `reason` comes from the
    /// [`LoginReasons`](crate::LoginReasons) table.
    #[error("login failed ({code}): {reason}")]
    LoginFailed {
        code: LoginFailReason,
        reason: String,
    },

    /// An operation was called in a state that doesn't allow it, e.g.
    /// opening a session twice.
    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: ConnectionState,
    },
}
