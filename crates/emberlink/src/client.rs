//! `ClientBuilder`, the `Client` event loop owner, and its `ClientHandle`.
//!
//! A [`Client`] owns everything about one server conversation: the
//! socket, the frame buffer, the session state machine, the entity
//! mirror, and the outbound tick. It runs as a single task (see
//! [`Client::run`]); the rest of the application talks to it through a
//! cheap, clonable [`ClientHandle`].

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use emberlink_protocol::{BincodeCodec, Codec, DisconnectReason, FrameCodec};
use emberlink_session::{
    ConnectionState, IntentEncoder, LoginReasons, MoveIntent, Session, SessionConfig,
};
use emberlink_tick::{TickConfig, TickScheduler};
use emberlink_transport::{Connection, TcpConnection, TransportError};
use emberlink_world::{Entity, EntityStore};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::EmberlinkError;

/// Server port used when none is given.
pub const DEFAULT_PORT: u16 = 9190;

/// Commands queued per client before `ClientHandle` calls wait.
const COMMAND_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a [`Client`] needs besides a connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity and protocol version for the handshake.
    pub session: SessionConfig,

    /// Outbound tick. Rate 0 sends intent changes immediately.
    pub tick: TickConfig,

    /// How long to keep the socket open after sending `Disconnect`, so
    /// the frame reaches the server before the stream is torn down.
    ///
    /// Default: 100 ms. Zero releases the transport right away.
    pub disconnect_grace: Duration,

    /// Text for login refusal codes.
    pub login_reasons: LoginReasons,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            tick: TickConfig::default(),
            disconnect_grace: Duration::from_millis(100),
            login_reasons: LoginReasons::default(),
        }
    }
}

/// Builder for connecting a [`Client`] over TCP.
///
/// # Example
///
/// ```rust,no_run
/// use emberlink::prelude::*;
///
/// # async fn demo() -> Result<(), EmberlinkError> {
/// let (client, handle) = ClientBuilder::new()
///     .connect_to("localhost", 9190)
///     .name("rsClient")
///     .build()
///     .await?;
///
/// let end = client.run().await?;
/// println!("{end}");
/// # drop(handle);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: String,
    port: u16,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            config: ClientConfig::default(),
        }
    }

    /// Server address.
    pub fn connect_to(mut self, host: &str, port: u16) -> Self {
        self.host = host.to_string();
        self.port = port;
        self
    }

    /// Player display name sent at login.
    pub fn name(mut self, name: &str) -> Self {
        self.config.session.name = name.to_string();
        self
    }

    pub fn auth_token(mut self, token: &str) -> Self {
        self.config.session.authtoken = token.to_string();
        self
    }

    pub fn permissions(mut self, permissions: u32) -> Self {
        self.config.session.permissions = permissions;
        self
    }

    /// Outbound ticks per second; 0 sends intent changes immediately.
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.tick.tick_rate_hz = hz;
        self
    }

    pub fn disconnect_grace(mut self, grace: Duration) -> Self {
        self.config.disconnect_grace = grace;
        self
    }

    pub fn login_reasons(mut self, reasons: LoginReasons) -> Self {
        self.config.login_reasons = reasons;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Connects to the server. The handshake starts when the returned
    /// client is [run](Client::run).
    ///
    /// # Errors
    /// [`TransportError::ConnectFailed`] if the server can't be reached.
    pub async fn build(
        self,
    ) -> Result<(Client<TcpConnection, BincodeCodec>, ClientHandle), EmberlinkError> {
        let conn = TcpConnection::connect(&self.host, self.port).await?;
        Ok(Client::new(conn, BincodeCodec, self.config))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SessionEnd
// ---------------------------------------------------------------------------

/// How a session that didn't fail came to an end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// We asked to leave.
    LocalQuit,

    /// The server sent `Disconnect`.
    PeerDisconnected {
        reason: DisconnectReason,
        reason_str: Option<String>,
    },

    /// The server closed the stream without saying goodbye.
    ConnectionClosed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalQuit => f.write_str("disconnected"),
            Self::PeerDisconnected {
                reason,
                reason_str: Some(text),
            } => write!(f, "server closed the session ({reason}): {text}"),
            Self::PeerDisconnected { reason, .. } => {
                write!(f, "server closed the session ({reason})")
            }
            Self::ConnectionClosed => f.write_str("connection closed by server"),
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Requests from a [`ClientHandle`] to the event loop.
#[derive(Debug)]
pub(crate) enum ClientCommand {
    /// Replace the current movement intent.
    SetIntent(MoveIntent),

    /// Leave the server with `Disconnect { reason: Quit, .. }`.
    Disconnect { reason_str: String },
}

/// Handle to a running [`Client`].
///
/// Cheap to clone. Input sources push intent through it and renderers
/// watch the world and connection state.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<ClientCommand>,
    world: watch::Receiver<Arc<Vec<Entity>>>,
    state: watch::Receiver<ConnectionState>,
}

impl ClientHandle {
    /// Sets where the player wants to move. Only changes reach the server,
    /// on the next tick.
    pub async fn set_intent(&self, intent: MoveIntent) -> Result<(), EmberlinkError> {
        self.send(ClientCommand::SetIntent(intent)).await
    }

    /// Asks the client to leave the server.
    pub async fn disconnect(&self, reason_str: &str) -> Result<(), EmberlinkError> {
        self.send(ClientCommand::Disconnect {
            reason_str: reason_str.to_string(),
        })
        .await
    }

    /// A receiver that is notified after every change to the entity
    /// mirror.
    pub fn world(&self) -> watch::Receiver<Arc<Vec<Entity>>> {
        self.world.clone()
    }

    /// The most recent entity snapshot, ordered by id.
    pub fn snapshot(&self) -> Arc<Vec<Entity>> {
        Arc::clone(&self.world.borrow())
    }

    /// A receiver that follows the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    async fn send(&self, cmd: ClientCommand) -> Result<(), EmberlinkError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| EmberlinkError::ClientGone)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One connection to a game server.
///
/// Generic over the transport and the payload codec so tests and other
/// transports can reuse the same event loop.
pub struct Client<C, K>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    pub(crate) conn: C,
    pub(crate) codec: K,
    pub(crate) frames: FrameCodec,
    pub(crate) session: Session,
    pub(crate) world: EntityStore,
    pub(crate) encoder: IntentEncoder,
    pub(crate) intent: MoveIntent,
    pub(crate) ticker: TickScheduler,
    pub(crate) commands: mpsc::Receiver<ClientCommand>,
    /// Cleared once every handle is dropped.
    pub(crate) commands_open: bool,
    pub(crate) world_tx: watch::Sender<Arc<Vec<Entity>>>,
    pub(crate) state_tx: watch::Sender<ConnectionState>,
    pub(crate) disconnect_grace: Duration,
    /// Set while waiting out `disconnect_grace`.
    pub(crate) linger_until: Option<Instant>,
}

impl<C, K> Client<C, K>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    /// Wraps an open connection. Nothing is sent until [`run`](Self::run).
    pub fn new(conn: C, codec: K, config: ClientConfig) -> (Self, ClientHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (world_tx, world_rx) = watch::channel(Arc::new(Vec::new()));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        // No input goes out before login; resumed once the session is active.
        let mut ticker = TickScheduler::new(config.tick);
        ticker.pause();

        let client = Self {
            conn,
            codec,
            frames: FrameCodec::new(),
            session: Session::with_reasons(config.session, config.login_reasons),
            world: EntityStore::new(),
            encoder: IntentEncoder::new(),
            intent: MoveIntent::IDLE,
            ticker,
            commands: cmd_rx,
            commands_open: true,
            world_tx,
            state_tx,
            disconnect_grace: config.disconnect_grace,
            linger_until: None,
        };
        let handle = ClientHandle {
            commands: cmd_tx,
            world: world_rx,
            state: state_rx,
        };
        (client, handle)
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// The live entity mirror.
    pub fn world(&self) -> &EntityStore {
        &self.world
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }
}
