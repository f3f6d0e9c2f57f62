//! Client side of the remote environment protocol.
//!
//! This module defines how a client talks to a remote storage server: the
//! message set, how messages are framed on a byte stream, and the blocking
//! request/reply primitive every environment, database and transaction
//! operation is built on.
//!
//! # Overview
//!
//! The protocol is strictly half-duplex. The client writes one request frame
//! and then blocks until the matching reply frame has been read. Replies carry
//! no request id; pairing is implied by order, which is why a connection can
//! never have more than one request in flight.
//!
//! # Key Components
//!
//! - [`Message`]: the union of every request and reply body.
//! - [`FrameCodec`]: writes and reads the 8-byte header and the payload.
//! - [`Transport`]: a plain byte pipe; [`TcpTransport`] is the socket version.
//! - [`Dispatcher`]: the "send request, block for reply" primitive.
//!
//! # Binary Format
//!
//! - Each frame begins with a 4-byte magic marker followed by the payload
//!   length as a big-endian `u32`.
//! - The payload is the message encoded with bincode, big-endian with fixed
//!   width integers.
//! - Header and payload are always read with two separate exact-length reads.
//!
//! # See Also
//!
//! - [`env`](crate::env): the operations that build requests and interpret replies.
mod codec;
mod dispatcher;
mod message;
mod request;
mod response;
mod transport;

pub use codec::{FrameCodec, HEADER_SIZE, MAGIC, ProtocolError, payload_len};
pub use dispatcher::Dispatcher;
pub use message::{Message, MessageKind};
pub use request::*;
pub use response::*;
pub use transport::{TcpTransport, Transport, TransportError};
