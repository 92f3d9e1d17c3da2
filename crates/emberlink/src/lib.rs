//! # Emberlink
//!
//! Network client for server-authoritative games.
//!
//! The server owns the world; the client connects over TCP, performs the
//! `Connect` / `Login` handshake, mirrors the entities the server tells
//! it about, and sends the player's movement intent back on a fixed tick.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emberlink::prelude::*;
//!
//! # async fn demo() -> Result<(), EmberlinkError> {
//! let (client, handle) = ClientBuilder::new()
//!     .connect_to("localhost", 9190)
//!     .name("rsClient")
//!     .build()
//!     .await?;
//!
//! // Input and rendering talk to the client through the handle.
//! let input = handle.clone();
//! tokio::spawn(async move {
//!     let _ = input.set_intent(MoveIntent::planar(1, 0)).await;
//! });
//!
//! let end = client.run().await?;
//! println!("{end}; last saw {} entities", handle.snapshot().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Layer |
//! |---|---|
//! | `emberlink-transport` | byte stream to the server |
//! | `emberlink-protocol` | frames, messages, wire codec |
//! | `emberlink-session` | handshake state machine, intent encoding |
//! | `emberlink-world` | local entity mirror |
//! | `emberlink-tick` | outbound tick |

mod client;
mod driver;
mod error;

pub use client::{
    Client, ClientBuilder, ClientConfig, ClientHandle, DEFAULT_PORT, SessionEnd,
};
pub use error::EmberlinkError;

pub use emberlink_protocol as protocol;
pub use emberlink_session as session;
pub use emberlink_tick as tick;
pub use emberlink_transport as transport;
pub use emberlink_world as world;

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ClientHandle, DEFAULT_PORT, EmberlinkError,
        SessionEnd,
    };
    pub use emberlink_protocol::{
        Axis, DisconnectReason, EntityId, LoginFailReason, Message, PROTOCOL_VERSION,
        StateValue, Vector3,
    };
    pub use emberlink_session::{ConnectionState, LoginReasons, MoveIntent, SessionConfig};
    pub use emberlink_tick::TickConfig;
    pub use emberlink_transport::{Connection, TcpConnection};
    pub use emberlink_world::{Entity, EntityStore};
}
