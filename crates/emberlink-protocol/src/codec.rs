//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and frame
//! payloads. The rest of the client doesn't care HOW messages are
//! serialized; it only needs something that implements [`Codec`].
//!
//! - [`BincodeCodec`] is the wire format: compact, little-endian,
//!   fixed-width integers, discriminant first.
//! - [`JsonCodec`] (feature `json`) is for humans: dumping traffic to
//!   logs, writing fixtures, poking a server by hand.

use std::marker::PhantomData;

use bincode::Options;
use serde::de::{DeserializeOwned, DeserializeSeed};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{STACK_RED_ZONE, STACK_SEGMENT};
use crate::{Message, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `decode` must consume the whole payload: a frame carries exactly one
/// message, and leftover bytes mean the peer and we disagree about the
/// layout.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame payload.
    ///
    /// # Errors
    /// Returns an encode error if the value can't be represented in this
    /// format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame payload back into a value.
    ///
    /// # Errors
    /// Returns a decode error if the bytes are malformed, truncated, carry
    /// an unknown discriminant, or have trailing data.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// BincodeCodec
// ---------------------------------------------------------------------------

/// The binary wire [`Codec`].
///
/// Layout rules (bincode with fixed-width integers):
///
/// | Type | Encoding |
/// |---|---|
/// | enum variant | `u32` LE index, then fields in order |
/// | `bool` | one byte, `0` or `1` (anything else is an error) |
/// | integers / floats | fixed width, little-endian |
/// | `String`, `Vec` | `u64` LE length, then elements |
/// | `Option` | one tag byte (`0` absent, `1` present), then the value |
///
/// The `Option` tag is what lets the decoder tell "field absent" from
/// "field present and empty".
///
/// Decoding runs on a stack that grows on demand, so nested `Array`
/// state values are accepted to whatever depth fits in a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        wire_options().serialize(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        wire_options()
            .deserialize_seed(Stacked::<T>(PhantomData), data)
            .map_err(ProtocolError::Decode)
    }
}

/// Deserializes `T` through [`serde_stacker`], which switches to a fresh
/// stack segment whenever the current one runs low.
struct Stacked<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> DeserializeSeed<'de> for Stacked<T> {
    type Value = T;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        let mut stacked = serde_stacker::Deserializer::new(deserializer);
        stacked.red_zone = STACK_RED_ZONE;
        stacked.stack_size = STACK_SEGMENT;
        T::deserialize(stacked)
    }
}

/// Encodes a message into a frame payload with the wire codec.
///
/// # Errors
/// See [`Codec::encode`].
pub fn encode(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    BincodeCodec.encode(msg)
}

/// Decodes a frame payload into a message with the wire codec.
///
/// # Errors
/// See [`Codec::decode`].
pub fn decode(payload: &[u8]) -> Result<Message, ProtocolError> {
    BincodeCodec.decode(payload)
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Not wire-compatible with a real server. Useful for logging traffic and
/// for fixtures.
///
/// ```rust
/// use emberlink_protocol::{Codec, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Message::connect(1)).unwrap();
/// assert_eq!(bytes, br#"{"Connect":{"version":1}}"#);
///
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Message::connect(1));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::JsonEncode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::JsonDecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Axis, DisconnectReason, EntityId, LoginFailReason, Sign, StateValue, Vector3,
    };

    fn every_message() -> Vec<Message> {
        vec![
            Message::connect(1),
            Message::disconnect(DisconnectReason::Quit, "Client disconnected"),
            Message::disconnect(DisconnectReason::ServerShutdown, ""),
            Message::login("Ada", "tok", 3),
            Message::LoginResult {
                succeeded: false,
                reason: LoginFailReason::ACCESS_DENIED,
            },
            Message::AddEntity {
                id: EntityId(5),
                name: Some("Orc".into()),
            },
            Message::AddEntity {
                id: EntityId(6),
                name: None,
            },
            Message::RemoveEntity {
                id: EntityId(5),
                name: None,
            },
            Message::UpdateState {
                id: EntityId(5),
                state_id: "HP".into(),
                value: Some(StateValue::Int(-10)),
            },
            Message::UpdateState {
                id: EntityId(5),
                state_id: "Pos".into(),
                value: Some(StateValue::Vector3(Vector3::new(1.0, -2.5, 0.0))),
            },
            Message::UpdateState {
                id: EntityId(5),
                state_id: "Gone".into(),
                value: None,
            },
            Message::move_axis(Axis::Y, Sign::Neg, true),
        ]
    }

    fn nested(depth: usize) -> StateValue {
        let mut value = StateValue::String("leaf".into());
        for i in 0..depth {
            value = StateValue::Array(vec![
                StateValue::Int(i as i64),
                value,
                StateValue::Bool(i % 2 == 0),
            ]);
        }
        value
    }

    #[test]
    fn test_bincode_round_trips_every_variant() {
        for msg in every_message() {
            let bytes = encode(&msg).unwrap();
            assert_eq!(decode(&bytes).unwrap(), msg, "round trip of {:?}", msg.kind());
        }
    }

    #[test]
    fn test_bincode_round_trips_nested_arrays() {
        for depth in [1, 3, 8] {
            let msg = Message::UpdateState {
                id: EntityId(1),
                state_id: "Inventory".into(),
                value: Some(nested(depth)),
            };
            assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
        }
    }

    #[test]
    fn test_deepest_array_that_fits_a_frame_decodes_on_worker_stack() {
        // Header: variant(4) id(8) len(8) "Bag"(3) tag(1); leaf: Bool(5);
        // every level adds variant(4) + length(8).
        let depth = (crate::MAX_PAYLOAD_LEN - 24 - 5) / 12;
        let mut value = StateValue::Bool(true);
        for _ in 0..depth {
            value = StateValue::Array(vec![value]);
        }
        let msg = Message::UpdateState {
            id: EntityId(1),
            state_id: "Bag".into(),
            value: Some(value),
        };

        // Same stack size as a tokio worker thread.
        let worker = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || {
                let bytes = encode(&msg).unwrap();
                assert!(crate::encode_frame(&bytes).is_ok());
                assert!(bytes.len() + 12 > crate::MAX_PAYLOAD_LEN);
                decode(&bytes).unwrap() == msg
            })
            .unwrap();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_discriminant_comes_first() {
        let bytes = encode(&Message::connect(7)).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 7, 0, 0, 0]);

        let bytes = encode(&Message::move_axis(Axis::X, Sign::Pos, true)).unwrap();
        assert_eq!(&bytes[..4], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_message_discriminant_is_an_error() {
        let err = decode(&99u32.to_le_bytes()).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_unknown_state_discriminant_is_an_error() {
        let msg = Message::UpdateState {
            id: EntityId(1),
            state_id: "HP".into(),
            value: Some(StateValue::Int(1)),
        };
        let mut bytes = encode(&msg).unwrap();
        // Layout: variant(4) id(8) len(8) "HP"(2) tag(1) → state variant at 23.
        assert_eq!(&bytes[23..27], &[1, 0, 0, 0]);
        bytes[23] = 42;
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        // A Connect discriminant with no version after it.
        let err = decode(&[0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_trailing_bytes_are_an_error() {
        let mut bytes = encode(&Message::connect(1)).unwrap();
        bytes.push(0);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_absent_and_empty_name_are_distinct() {
        let absent = Message::AddEntity {
            id: EntityId(1),
            name: None,
        };
        let empty = Message::AddEntity {
            id: EntityId(1),
            name: Some(String::new()),
        };
        let absent_bytes = encode(&absent).unwrap();
        let empty_bytes = encode(&empty).unwrap();
        assert_ne!(absent_bytes, empty_bytes);
        assert_eq!(decode(&absent_bytes).unwrap(), absent);
        assert_eq!(decode(&empty_bytes).unwrap(), empty);
    }

    #[test]
    fn test_absent_value_and_zero_value_are_distinct() {
        let absent = Message::UpdateState {
            id: EntityId(1),
            state_id: "HP".into(),
            value: None,
        };
        let zero = Message::UpdateState {
            id: EntityId(1),
            state_id: "HP".into(),
            value: Some(StateValue::Int(0)),
        };
        assert_eq!(decode(&encode(&absent).unwrap()).unwrap(), absent);
        assert_eq!(decode(&encode(&zero).unwrap()).unwrap(), zero);
    }

    #[test]
    fn test_invalid_bool_byte_is_an_error() {
        let mut bytes = encode(&Message::LoginResult {
            succeeded: true,
            reason: LoginFailReason::NONE,
        })
        .unwrap();
        bytes[4] = 2;
        assert!(decode(&bytes).is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_codec_round_trips_every_variant() {
        let codec = JsonCodec;
        for msg in every_message() {
            let bytes = codec.encode(&msg).unwrap();
            let decoded: Message = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_garbage_returns_error() {
        let result: Result<Message, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::JsonDecode(_))));
    }
}
