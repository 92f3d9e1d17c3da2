//! Wire protocol for Emberlink.
//!
//! This crate defines the "language" the client speaks with a game server:
//!
//! - **Frames** ([`FrameCodec`], [`encode_frame`]): how a TCP byte stream
//!   is cut into discrete payloads (2-byte length prefix + payload).
//! - **Types** ([`Message`], [`StateValue`], [`EntityId`], etc.): the
//!   tagged unions that travel inside those payloads.
//! - **Codec** ([`Codec`] trait, [`BincodeCodec`], [`JsonCodec`]): how
//!   messages are converted to/from payload bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong along the way.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (handshake and routing). It doesn't know about sockets or entities;
//! it only knows how to cut, serialize, and deserialize messages.
//!
//! ```text
//! Transport (bytes) → FrameCodec (payloads) → Codec (Message) → Session
//! ```

mod codec;
mod error;
mod frame;
mod types;

pub use codec::{BincodeCodec, Codec, decode, encode};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use frame::{FrameCodec, LENGTH_PREFIX_LEN, MAX_PAYLOAD_LEN, encode_frame};
pub use types::{
    Axis, DisconnectReason, EntityId, LoginFailReason, Message, MessageKind,
    Sign, StateValue, Vector3,
};

/// The protocol revision this client speaks.
///
/// Sent in the opening `Connect`; the server must echo the same value or
/// the session is torn down. Revision 1 carries `Move` as
/// axis + sign + start/stop.
pub const PROTOCOL_VERSION: u32 = 1;
