//! Session layer for Emberlink.
//!
//! This crate decides what the client says and when:
//!
//! 1. **Handshake**: `Connect` → version check → `Login` → `LoginResult`
//!    ([`Session`], [`ConnectionState`])
//! 2. **World sync**: once logged in, server messages are routed into the
//!    [`EntityStore`](emberlink_world::EntityStore)
//! 3. **Input**: per-tick movement intent becomes a minimal stream of
//!    `Move` messages ([`IntentEncoder`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client driver (above)  ← owns the socket, feeds messages in, sends steps out
//!     ↕
//! Session Layer (this crate)  ← pure state machine, no I/O
//!     ↕
//! Protocol / World (below)  ← Message types, entity mirror
//! ```
//!
//! Nothing here touches a socket or a timer. The caller hands in decoded
//! messages and gets back what to send, which keeps every transition
//! testable without a network.

mod error;
mod intent;
mod reasons;
mod session;

pub use error::SessionError;
pub use intent::{IntentEncoder, MoveIntent};
pub use reasons::{LoginReasons, UNKNOWN_REASON};
pub use session::{ConnectionState, Session, SessionConfig, Step};
