//! Length-prefixed framing of [`Message`]s.
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────┐
//! │ Magic        │ Length       │ Payload             │
//! │ 4 bytes      │ 4 bytes      │ `Length` bytes      │
//! │ "ham1"       │ uint32 BE    │ bincode, BE fixint  │
//! └──────────────┴──────────────┴─────────────────────┘
//! ```
use std::fmt;

use bincode::{
    config::{BigEndian, Configuration, Fixint},
    decode_from_slice,
    error::{DecodeError, EncodeError},
    encode_into_std_write,
};
use thiserror::Error;

use crate::config::DEFAULT_MAX_PAYLOAD_SIZE;

use super::{Message, MessageKind};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 8;

/// Protocol magic and version marker.
pub const MAGIC: [u8; 4] = *b"ham1";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("bad frame magic {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("truncated frame header ({0} bytes)")]
    TruncatedHeader(usize),
    #[error("frame declares {declared} payload bytes but carries {actual}")]
    LengthMismatch { declared: u32, actual: usize },
    #[error("frame payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: u32, max: u32 },
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
    #[error("expected {expected:?}, received {received:?}")]
    UnexpectedReply {
        expected: MessageKind,
        received: MessageKind,
    },
}

/// Reads the payload length out of a frame header.
pub fn payload_len(header: &[u8]) -> Result<u32, ProtocolError> {
    let bytes: [u8; 4] = header
        .get(4..HEADER_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(ProtocolError::TruncatedHeader(header.len()))?;
    Ok(u32::from_be_bytes(bytes))
}

/// Encodes and decodes frames, reusing one scratch buffer for both
/// directions. Slices handed out borrow that buffer and are invalidated by
/// the next call.
pub struct FrameCodec {
    buffer: Vec<u8>,
    config: Configuration<BigEndian, Fixint>,
    max_payload_size: u32,
}

impl fmt::Debug for FrameCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCodec")
            .field("buffered", &self.buffer.len())
            .field("max_payload_size", &self.max_payload_size)
            .finish_non_exhaustive()
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_SIZE)
    }
}

impl FrameCodec {
    pub fn new(max_payload_size: u32) -> Self {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_fixed_int_encoding();
        Self {
            buffer: Vec::with_capacity(256),
            config,
            max_payload_size,
        }
    }

    /// Serializes `message` into a complete frame.
    pub fn encode(&mut self, message: &Message) -> Result<&[u8], EncodeError> {
        self.buffer.clear();
        self.buffer.extend_from_slice(&MAGIC);
        self.buffer.extend_from_slice(&[0; 4]);

        let written = encode_into_std_write(message, &mut self.buffer, self.config)?;
        let len = u32::try_from(written)
            .map_err(|_| EncodeError::Other("payload does not fit a 32-bit length"))?;
        self.buffer[4..HEADER_SIZE].copy_from_slice(&len.to_be_bytes());

        Ok(&self.buffer)
    }

    /// Parses a frame given as separate header and payload slices.
    pub fn decode(&self, header: &[u8], payload: &[u8]) -> Result<Message, ProtocolError> {
        let magic: [u8; 4] = header
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolError::TruncatedHeader(header.len()))?;
        if magic != MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }

        let declared = payload_len(header)?;
        if declared as usize != payload.len() {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        let (message, read) = decode_from_slice::<Message, _>(payload, self.config)?;
        if read != payload.len() {
            return Err(ProtocolError::TrailingBytes(payload.len() - read));
        }
        Ok(message)
    }

    /// Scratch space for an incoming header.
    pub fn header_buf(&mut self) -> &mut [u8] {
        self.buffer.clear();
        self.buffer.resize(HEADER_SIZE, 0);
        &mut self.buffer
    }

    /// Scratch space for the payload announced by the header previously read
    /// into [`header_buf`](Self::header_buf).
    pub fn payload_buf(&mut self) -> Result<&mut [u8], ProtocolError> {
        let len = payload_len(&self.buffer)?;
        if self.buffer[..4] != MAGIC {
            let mut magic = [0; 4];
            magic.copy_from_slice(&self.buffer[..4]);
            return Err(ProtocolError::BadMagic(magic));
        }
        if len > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                len,
                max: self.max_payload_size,
            });
        }
        self.buffer.resize(HEADER_SIZE + len as usize, 0);
        Ok(&mut self.buffer[HEADER_SIZE..])
    }

    /// Decodes the frame currently held in the scratch buffer.
    pub fn decode_buffered(&self) -> Result<Message, ProtocolError> {
        if self.buffer.len() < HEADER_SIZE {
            return Err(ProtocolError::TruncatedHeader(self.buffer.len()));
        }
        let (header, payload) = self.buffer.split_at(HEADER_SIZE);
        self.decode(header, payload)
    }
}
