//! The connection state machine.
//!
//! A [`Session`] is the client's half of one conversation with a server.
//! It owns the handshake and decides which inbound messages are allowed
//! to touch the world. It performs no I/O itself: every call returns what
//! the caller should do next (usually "send this message").

use std::fmt;

use emberlink_protocol::{DisconnectReason, Message, PROTOCOL_VERSION};
use emberlink_world::{EntityStore, StoreOutcome};

use crate::{LoginReasons, SessionError};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Who the client claims to be and which protocol it speaks.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name sent in `Login`.
    pub name: String,

    /// Opaque credential sent in `Login`. Empty for open servers.
    pub authtoken: String,

    /// Permission bits requested at login.
    pub permissions: u32,

    /// Protocol version announced in `Connect`. The server must echo it.
    ///
    /// Default: [`PROTOCOL_VERSION`].
    pub version: u32,
}

impl SessionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "player".into(),
            authtoken: String::new(),
            permissions: 0,
            version: PROTOCOL_VERSION,
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
/// Disconnected ──open──→ AwaitingConnectAck ──Connect(v)──→ AwaitingLoginResult
///                                │                                  │
///                           v mismatch                     LoginResult(ok)
///                                │                                  ▼
///                                ▼           ┌───────────────── Active
///                              Closed ←──────┤                      │
///                                ↑           └── fatal / peer    close()
///                                │                Disconnect        ▼
///                                └──────────finish()────────── Disconnecting
/// ```
///
/// `Closed` is terminal: nothing is sent or applied after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    AwaitingConnectAck,
    AwaitingLoginResult,
    Active,
    Disconnecting,
    Closed,
}

impl ConnectionState {
    /// Logged in and mirroring the world.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingConnectAck => "awaiting connect ack",
            Self::AwaitingLoginResult => "awaiting login result",
            Self::Active => "active",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// What handling one inbound message produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Send this message to the server.
    Send(Message),

    /// The login was accepted; the session is now [`ConnectionState::Active`].
    Established,

    /// The message was routed to the entity store.
    Applied(StoreOutcome),

    /// The message was not expected in the current state and was dropped.
    Ignored,

    /// The server ended the session.
    PeerClosed {
        reason: DisconnectReason,
        reason_str: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One client session.
///
/// Inbound messages enter through [`on_message`](Self::on_message) only,
/// strictly in arrival order. World messages reach the store only while
/// [`ConnectionState::Active`].
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: ConnectionState,
    reasons: LoginReasons,
    span: tracing::Span,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_reasons(config, LoginReasons::default())
    }

    pub fn with_reasons(config: SessionConfig, reasons: LoginReasons) -> Self {
        let span = tracing::info_span!("session", name = %config.name);
        Self {
            config,
            state: ConnectionState::Disconnected,
            reasons,
            span,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn reasons(&self) -> &LoginReasons {
        &self.reasons
    }

    /// The span every log line of this session is recorded under.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Starts the handshake. Returns the `Connect` to send.
    ///
    /// # Errors
    /// [`SessionError::InvalidState`] unless the session is fresh.
    pub fn open(&mut self) -> Result<Message, SessionError> {
        let _entered = self.span.enter();
        if self.state != ConnectionState::Disconnected {
            return Err(SessionError::InvalidState {
                op: "open",
                state: self.state,
            });
        }
        self.state = ConnectionState::AwaitingConnectAck;
        tracing::info!(version = self.config.version, "opening session");
        Ok(Message::connect(self.config.version))
    }

    /// Handles one inbound message.
    ///
    /// # Errors
    /// A version mismatch or refused login closes the session and is
    /// returned as an error. Nothing should be sent afterwards; the caller
    /// only releases the transport.
    pub fn on_message(
        &mut self,
        msg: Message,
        world: &mut EntityStore,
    ) -> Result<Step, SessionError> {
        let span = self.span.clone();
        let _entered = span.enter();
        tracing::trace!(kind = %msg.kind(), state = %self.state, "<<");

        match (self.state, msg) {
            // -- Peer hang-up, accepted anywhere the session is open --
            (
                ConnectionState::AwaitingConnectAck
                | ConnectionState::AwaitingLoginResult
                | ConnectionState::Active
                | ConnectionState::Disconnecting,
                Message::Disconnect { reason, reason_str },
            ) => {
                self.state = ConnectionState::Closed;
                tracing::info!(%reason, ?reason_str, "server closed the session");
                Ok(Step::PeerClosed { reason, reason_str })
            }

            // -- Handshake --
            (ConnectionState::AwaitingConnectAck, Message::Connect { version }) => {
                if version != self.config.version {
                    self.state = ConnectionState::Closed;
                    tracing::error!(
                        local = self.config.version,
                        remote = version,
                        "protocol version mismatch"
                    );
                    return Err(SessionError::VersionMismatch {
                        local: self.config.version,
                        remote: version,
                    });
                }
                self.state = ConnectionState::AwaitingLoginResult;
                tracing::debug!(version, "connect acknowledged, logging in");
                Ok(Step::Send(Message::login(
                    self.config.name.clone(),
                    self.config.authtoken.clone(),
                    self.config.permissions,
                )))
            }

            (ConnectionState::AwaitingLoginResult, Message::LoginResult { succeeded, reason }) => {
                if !succeeded {
                    self.state = ConnectionState::Closed;
                    let text = self.reasons.describe(reason).to_owned();
                    tracing::error!(code = %reason, reason = %text, "login refused");
                    return Err(SessionError::LoginFailed { code: reason, reason: text });
                }
                self.state = ConnectionState::Active;
                tracing::info!("logged in");
                Ok(Step::Established)
            }

            // -- World sync --
            (ConnectionState::Active, Message::AddEntity { id, name }) => {
                Ok(Step::Applied(world.add(id, name)))
            }
            (ConnectionState::Active, Message::RemoveEntity { id, name }) => {
                Ok(Step::Applied(world.remove(id, name.as_deref())))
            }
            (ConnectionState::Active, Message::UpdateState { id, state_id, value }) => {
                Ok(Step::Applied(world.update_state(id, state_id, value)))
            }

            // World traffic still in flight after we said goodbye.
            (ConnectionState::Disconnecting, other) => {
                tracing::debug!(kind = %other.kind(), "dropping message while disconnecting");
                Ok(Step::Ignored)
            }

            (state, other) => {
                tracing::warn!(kind = %other.kind(), %state, "unexpected message, discarding");
                Ok(Step::Ignored)
            }
        }
    }

    /// Begins a local close.
    ///
    /// Returns the `Disconnect` to send, or `None` when there is nobody to
    /// tell (never opened, already closing, or closed). Call
    /// [`finish`](Self::finish) once the transport has been released.
    pub fn close(
        &mut self,
        reason: DisconnectReason,
        reason_str: impl Into<String>,
    ) -> Option<Message> {
        let _entered = self.span.enter();
        match self.state {
            ConnectionState::Disconnecting | ConnectionState::Closed => None,
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Closed;
                None
            }
            _ => {
                self.state = ConnectionState::Disconnecting;
                let msg = Message::disconnect(reason, reason_str);
                tracing::info!(%reason, "disconnecting");
                Some(msg)
            }
        }
    }

    /// Completes a local close once the transport is gone.
    pub fn finish(&mut self) {
        if self.state == ConnectionState::Disconnecting {
            let _entered = self.span.enter();
            self.state = ConnectionState::Closed;
            tracing::info!("session closed");
        }
    }

    /// Marks the session dead after a failure outside the state machine
    /// (undecodable frame, lost connection).
    pub fn fail(&mut self) {
        if self.state != ConnectionState::Closed {
            let _entered = self.span.enter();
            tracing::debug!(from = %self.state, "session failed");
            self.state = ConnectionState::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.name, "player");
        assert_eq!(config.authtoken, "");
        assert_eq!(config.permissions, 0);
        assert_eq!(config.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_config_new_keeps_other_defaults() {
        let config = SessionConfig::new("rsClient");
        assert_eq!(config.name, "rsClient");
        assert_eq!(config.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Active.is_active());
        assert!(!ConnectionState::Disconnecting.is_active());
        assert!(ConnectionState::Closed.is_terminal());
    }

    #[test]
    fn test_close_before_open_sends_nothing() {
        let mut session = Session::new(SessionConfig::default());
        assert_eq!(session.close(DisconnectReason::Quit, ""), None);
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut session = Session::new(SessionConfig::default());
        session.open().unwrap();
        session.fail();
        assert_eq!(session.state(), ConnectionState::Closed);
        assert_eq!(session.close(DisconnectReason::Quit, "bye"), None);
    }

    #[test]
    fn test_finish_only_completes_a_close() {
        let mut session = Session::new(SessionConfig::default());
        session.open().unwrap();
        session.finish();
        assert_eq!(session.state(), ConnectionState::AwaitingConnectAck);
    }
}
