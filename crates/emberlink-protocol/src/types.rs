//! Core protocol types for Emberlink's wire format.
//!
//! Every type here travels "on the wire": it is serialized into a frame
//! payload by a [`Codec`](crate::Codec) and parsed back on the other side.
//!
//! # Discriminants
//!
//! `Message` and `StateValue` use serde's default *externally tagged*
//! representation. With the binary codec this means the variant index is
//! written first (a little-endian `u32`), followed by the variant's fields
//! in declaration order. The decoder reads the discriminant before any
//! field, and an index it does not know is a decode error.
//!
//! Variant order is therefore part of the protocol: **never reorder or
//! insert variants**, only append.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Server-assigned identifier of an entity.
///
/// Newtype over `u64` so an entity id can't be confused with a protocol
/// version or a permission mask. `#[serde(transparent)]` keeps it a bare
/// integer on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// State values
// ---------------------------------------------------------------------------

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Creates a vector from its components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared length; cheaper than `len` when only comparing magnitudes.
    pub fn len_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

/// Headroom below which recursive `StateValue` code switches to a fresh
/// stack segment.
pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment allocated by that switch.
pub(crate) const STACK_SEGMENT: usize = 1024 * 1024;

/// A named state value the server attaches to an entity.
///
/// `Array` is recursive: elements may themselves be arrays, to any depth.
/// A single frame can carry thousands of nesting levels, so every
/// recursive walk over a value (serialize, clone, compare) grows the
/// stack on demand and `Drop` flattens instead of recursing. Decoding
/// gets the same treatment in [`BincodeCodec`](crate::BincodeCodec).
#[derive(Debug, Deserialize)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector3(Vector3),
    Array(Vec<StateValue>),
}

impl Serialize for StateValue {
    // Same shape as the derived impl: variant index, then the payload.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || match self {
            Self::Bool(v) => serializer.serialize_newtype_variant("StateValue", 0, "Bool", v),
            Self::Int(v) => serializer.serialize_newtype_variant("StateValue", 1, "Int", v),
            Self::Float(v) => serializer.serialize_newtype_variant("StateValue", 2, "Float", v),
            Self::String(v) => {
                serializer.serialize_newtype_variant("StateValue", 3, "String", v)
            }
            Self::Vector3(v) => {
                serializer.serialize_newtype_variant("StateValue", 4, "Vector3", v)
            }
            Self::Array(v) => serializer.serialize_newtype_variant("StateValue", 5, "Array", v),
        })
    }
}

impl Clone for StateValue {
    fn clone(&self) -> Self {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::Int(v) => Self::Int(*v),
            Self::Float(v) => Self::Float(*v),
            Self::String(v) => Self::String(v.clone()),
            Self::Vector3(v) => Self::Vector3(*v),
            Self::Array(items) => Self::Array(items.clone()),
        })
    }
}

impl PartialEq for StateValue {
    fn eq(&self, other: &Self) -> bool {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Vector3(a), Self::Vector3(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        })
    }
}

impl Drop for StateValue {
    fn drop(&mut self) {
        let Self::Array(items) = self else {
            return;
        };
        // Move nested elements onto a heap worklist so each one is dropped
        // with an already emptied array.
        let mut pending = std::mem::take(items);
        while let Some(mut value) = pending.pop() {
            if let Self::Array(inner) = &mut value {
                pending.append(inner);
            }
        }
    }
}

impl StateValue {
    /// Short name of the active variant, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Vector3(_) => "vector3",
            Self::Array(_) => "array",
        }
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for StateValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vector3> for StateValue {
    fn from(v: Vector3) -> Self {
        Self::Vector3(v)
    }
}

impl From<Vec<StateValue>> for StateValue {
    fn from(v: Vec<StateValue>) -> Self {
        Self::Array(v)
    }
}

// ---------------------------------------------------------------------------
// Reason codes
// ---------------------------------------------------------------------------

/// Why a peer is closing the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The player chose to leave.
    Quit,
    /// The server removed the player.
    Kicked,
    /// The server is going down.
    ServerShutdown,
    /// The peer received something it could not handle.
    ProtocolError,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quit => "quit",
            Self::Kicked => "kicked",
            Self::ServerShutdown => "server shutdown",
            Self::ProtocolError => "protocol error",
        };
        f.write_str(s)
    }
}

/// Why the server refused a login.
///
/// Kept as a raw code rather than a closed enum: servers add codes over
/// time, and an unfamiliar code must still reach the reason table (which
/// falls back to "Unknown reason") instead of failing the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoginFailReason(pub u32);

impl LoginFailReason {
    /// Sent alongside a successful login.
    pub const NONE: Self = Self(0);
    pub const ACCESS_DENIED: Self = Self(1);
    pub const NAME_TAKEN: Self = Self(2);
    pub const SERVER_FULL: Self = Self(3);
    pub const BANNED: Self = Self(4);
}

impl fmt::Display for LoginFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// A world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Every axis, in the fixed order movement diffs are emitted.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Pos,
    Neg,
}

impl Sign {
    /// Sign of a non-zero intent value; zero counts as negative.
    pub fn of(value: i8) -> Self {
        if value > 0 { Self::Pos } else { Self::Neg }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Every message that travels between client and server.
///
/// Exactly one variant is active per message. The variant index is the
/// discriminant on the wire (see the module docs), so this order is
/// frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    // -- Handshake --

    /// Client → Server opens the session; Server → Client acknowledges it
    /// by echoing the protocol version it speaks.
    Connect { version: u32 },

    /// Either direction: "I'm closing the session."
    Disconnect {
        reason: DisconnectReason,
        reason_str: Option<String>,
    },

    /// Client → Server: identify the player.
    Login {
        name: String,
        authtoken: String,
        permissions: u32,
    },

    /// Server → Client: outcome of `Login`. `reason` is meaningful only
    /// when `succeeded` is false.
    LoginResult {
        succeeded: bool,
        reason: LoginFailReason,
    },

    // -- World sync (Server → Client) --

    /// A new entity entered the client's view.
    AddEntity { id: EntityId, name: Option<String> },

    /// An entity left the client's view.
    RemoveEntity { id: EntityId, name: Option<String> },

    /// One named state of an entity changed. A missing `value` is kept
    /// distinct from a present-but-zero value.
    UpdateState {
        id: EntityId,
        state_id: String,
        value: Option<StateValue>,
    },

    // -- Input (Client → Server) --

    /// Start or stop moving along one axis. Protocol revision 1 shape.
    Move { axis: Axis, sign: Sign, start: bool },
}

impl Message {
    /// Opening handshake message.
    pub fn connect(version: u32) -> Self {
        Self::Connect { version }
    }

    /// Login request.
    pub fn login(
        name: impl Into<String>,
        authtoken: impl Into<String>,
        permissions: u32,
    ) -> Self {
        Self::Login {
            name: name.into(),
            authtoken: authtoken.into(),
            permissions,
        }
    }

    /// Disconnect notice. An empty `reason_str` is sent as absent.
    pub fn disconnect(reason: DisconnectReason, reason_str: impl Into<String>) -> Self {
        let reason_str = reason_str.into();
        Self::Disconnect {
            reason,
            reason_str: (!reason_str.is_empty()).then_some(reason_str),
        }
    }

    /// Movement start/stop along one axis.
    pub fn move_axis(axis: Axis, sign: Sign, start: bool) -> Self {
        Self::Move { axis, sign, start }
    }

    /// The active variant, without its fields.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Connect { .. } => MessageKind::Connect,
            Self::Disconnect { .. } => MessageKind::Disconnect,
            Self::Login { .. } => MessageKind::Login,
            Self::LoginResult { .. } => MessageKind::LoginResult,
            Self::AddEntity { .. } => MessageKind::AddEntity,
            Self::RemoveEntity { .. } => MessageKind::RemoveEntity,
            Self::UpdateState { .. } => MessageKind::UpdateState,
            Self::Move { .. } => MessageKind::Move,
        }
    }
}

/// Field-less mirror of [`Message`]'s variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Connect,
    Disconnect,
    Login,
    LoginResult,
    AddEntity,
    RemoveEntity,
    UpdateState,
    Move,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::Login => "Login",
            Self::LoginResult => "LoginResult",
            Self::AddEntity => "AddEntity",
            Self::RemoveEntity => "RemoveEntity",
            Self::UpdateState => "UpdateState",
            Self::Move => "Move",
        };
        f.write_str(s)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&EntityId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "E-7");
    }

    #[test]
    fn test_login_fail_reason_is_plain_number() {
        let json = serde_json::to_string(&LoginFailReason::SERVER_FULL).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_vector_len_squared() {
        assert_eq!(Vector3::new(1.0, 2.0, 2.0).len_squared(), 9.0);
        assert_eq!(Vector3::default().len_squared(), 0.0);
    }

    #[test]
    fn test_state_value_kind_and_numeric_view() {
        assert_eq!(StateValue::Int(3).kind(), "int");
        assert_eq!(StateValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(StateValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(StateValue::from("hp").as_f64(), None);
        assert_eq!(StateValue::Array(Vec::new()).kind(), "array");
    }

    fn tower(depth: usize) -> StateValue {
        let mut value = StateValue::Bool(true);
        for _ in 0..depth {
            value = StateValue::Array(vec![value]);
        }
        value
    }

    #[test]
    fn test_state_value_json_shape() {
        let value = StateValue::Array(vec![
            StateValue::Int(1),
            StateValue::Vector3(Vector3::new(0.0, 1.0, 2.0)),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "Array": [
                { "Int": 1 },
                { "Vector3": { "x": 0.0, "y": 1.0, "z": 2.0 } }
            ] })
        );
    }

    #[test]
    fn test_state_value_equality_is_per_variant() {
        assert_eq!(StateValue::Int(1), StateValue::Int(1));
        assert_ne!(StateValue::Int(1), StateValue::Float(1.0));
        assert_ne!(tower(3), tower(4));
    }

    #[test]
    fn test_deep_tower_clones_compares_and_drops_on_small_stack() {
        // A worker-sized stack; without growth this overflows long before
        // the last level.
        let worker = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let value = tower(20_000);
                let copy = value.clone();
                let same = copy == value;
                drop(copy);
                drop(value);
                same
            })
            .unwrap();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_message_is_externally_tagged() {
        // Binary codecs need the discriminant before the fields, which is
        // what the externally tagged form gives us.
        let json = serde_json::to_value(Message::connect(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "Connect": { "version": 1 } }));
    }

    #[test]
    fn test_disconnect_constructor_drops_empty_reason() {
        let msg = Message::disconnect(DisconnectReason::Quit, "");
        assert_eq!(
            msg,
            Message::Disconnect {
                reason: DisconnectReason::Quit,
                reason_str: None,
            }
        );

        let msg = Message::disconnect(DisconnectReason::Quit, "bye");
        assert!(matches!(
            msg,
            Message::Disconnect { reason_str: Some(ref s), .. } if s == "bye"
        ));
    }

    #[test]
    fn test_login_constructor() {
        let msg = Message::login("Ada", "", 0);
        assert_eq!(msg.kind(), MessageKind::Login);
        assert!(matches!(msg, Message::Login { ref name, .. } if name == "Ada"));
    }

    #[test]
    fn test_sign_of() {
        assert_eq!(Sign::of(1), Sign::Pos);
        assert_eq!(Sign::of(-1), Sign::Neg);
        assert_eq!(Sign::of(0), Sign::Neg);
    }

    #[test]
    fn test_axis_order_is_x_y_z() {
        assert_eq!(Axis::ALL, [Axis::X, Axis::Y, Axis::Z]);
    }

    #[test]
    fn test_message_kind_display() {
        let msg = Message::UpdateState {
            id: EntityId(1),
            state_id: "HP".into(),
            value: None,
        };
        assert_eq!(msg.kind().to_string(), "UpdateState");
    }

    #[test]
    fn test_decode_unknown_variant_name_returns_error() {
        let unknown = r#"{"FlyToMoon": {"speed": 9000}}"#;
        let result: Result<Message, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
