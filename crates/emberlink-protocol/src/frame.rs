//! Length-prefixed framing over a byte stream.
//!
//! TCP delivers a stream, not messages: one read may hold half a frame,
//! exactly one frame, or several frames glued together. [`FrameCodec`]
//! buffers whatever arrives and hands back whole payloads one at a time.
//!
//! Wire format:
//!
//! ```text
//! ┌──────────────────┬─────────────────────────┐
//! │ Length (2B)      │ Payload (Length bytes)  │
//! │ u16 little-endian│                         │
//! └──────────────────┴─────────────────────────┘
//! ```
//!
//! The reassembly buffer is unbounded. A peer that announces large frames
//! and never finishes them can grow it up to one partial frame (64 KiB)
//! at a time, but a peer that floods complete frames faster than they are
//! drained grows it without limit.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 2;

/// Largest payload the length prefix can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Incremental frame reassembler.
///
/// ```rust
/// use emberlink_protocol::{FrameCodec, encode_frame};
///
/// let wire = encode_frame(b"hello").unwrap();
/// let mut frames = FrameCodec::new();
///
/// frames.push(&wire[..3]);
/// assert!(frames.next_frame().is_none());
///
/// frames.push(&wire[3..]);
/// assert_eq!(frames.next_frame().unwrap().as_ref(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct FrameCodec {
    buf: BytesMut,
}

impl FrameCodec {
    /// Creates an empty codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes to the reassembly buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete payload.
    ///
    /// Returns `None` while the buffer holds only part of a prefix or part
    /// of a payload; nothing is consumed in that case. Call it in a loop
    /// until it returns `None`.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        if self.buf.len() < LENGTH_PREFIX_LEN {
            return None;
        }
        let len = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize;
        if self.buf.len() < LENGTH_PREFIX_LEN + len {
            return None;
        }
        self.buf.advance(LENGTH_PREFIX_LEN);
        Some(self.buf.split_to(len).freeze())
    }

    /// Number of bytes waiting for the rest of their frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

/// Prepends the length prefix to a payload.
///
/// # Errors
/// Returns [`ProtocolError::FrameTooLarge`] if the payload is longer than
/// [`MAX_PAYLOAD_LEN`].
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, ProtocolError> {
    let len = u16::try_from(payload.len())
        .map_err(|_| ProtocolError::FrameTooLarge { len: payload.len() })?;
    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    out.put_u16_le(len);
    out.put_slice(payload);
    Ok(out.freeze())
}
