use log::{trace, warn};

use crate::{Error, config::ClientConfig};

use super::{FrameCodec, Message, ProtocolError, Transport, TransportError};

/// Synchronous request/reply over one [`Transport`].
///
/// There are no request ids on the wire: a reply is matched to a request by
/// order alone, so only one request may be outstanding at a time.
#[derive(Debug)]
pub struct Dispatcher<T: Transport> {
    transport: T,
    codec: FrameCodec,
    config: ClientConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            codec: FrameCodec::new(config.max_payload_size),
            config,
        }
    }

    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        self.transport.connect(host, port, &self.config)
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request` and blocks until its reply has been read.
    ///
    /// Any transport failure closes the connection; the byte stream cannot be
    /// resynchronised once a frame has been partially exchanged.
    pub fn perform_request(&mut self, request: &Message) -> Result<Message, Error> {
        let frame = self.codec.encode(request).map_err(Error::Internal)?;
        trace!("sending {:?} ({} bytes)", request.kind(), frame.len());

        if let Err(e) = self.transport.send(frame) {
            return Err(self.teardown(e));
        }

        if let Err(e) = self.transport.receive_exact(self.codec.header_buf()) {
            return Err(self.teardown(e));
        }

        let payload = match self.codec.payload_buf() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("unreadable reply header: {e}");
                self.transport.close();
                return Err(Error::Protocol(e));
            }
        };
        trace!("receiving {} payload bytes", payload.len());
        if let Err(e) = self.transport.receive_exact(payload) {
            return Err(self.teardown(e));
        }

        let reply = self.codec.decode_buffered()?;
        let expected = request.kind().reply_kind();
        if expected != Some(reply.kind()) {
            return Err(Error::Protocol(ProtocolError::UnexpectedReply {
                expected: expected.unwrap_or(request.kind()),
                received: reply.kind(),
            }));
        }
        Ok(reply)
    }

    fn teardown(&mut self, err: TransportError) -> Error {
        warn!("closing connection after transport failure: {err}");
        self.transport.close();
        Error::Io(err)
    }
}

impl<T: Transport> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
