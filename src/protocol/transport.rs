use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
};

use log::{debug, trace};
use thiserror::Error;

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("could not resolve '{0}'")]
    Resolve(String),
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
}

/// Byte pipe to a remote environment server.
///
/// Implementations know nothing about frames. `close` must be idempotent and
/// safe to call on a transport that never connected.
pub trait Transport {
    fn connect(&mut self, host: &str, port: u16, config: &ClientConfig)
    -> Result<(), TransportError>;

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Blocks until `buf` is completely filled or the connection fails.
    fn receive_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    fn close(&mut self);

    fn is_connected(&self) -> bool;
}

/// [`Transport`] over a blocking TCP socket.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl Transport for TcpTransport {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        config: &ClientConfig,
    ) -> Result<(), TransportError> {
        self.close();

        let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve(format!("{host}:{port}")));
        }

        let mut last_err = None;
        for addr in addrs {
            let attempt = match config.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(config.read_timeout)?;
                    debug!("connected to {addr}");
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    trace!("connect to {addr} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .map(TransportError::Io)
            .unwrap_or_else(|| TransportError::Resolve(format!("{host}:{port}"))))
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn receive_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let stream = self.stream()?;
        stream.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::Io(e),
        })
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // the peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
            debug!("socket closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread};

    use super::*;

    #[test]
    fn send_before_connect_is_rejected() {
        let mut transport = TcpTransport::new();

        let err = transport.send(b"ping").unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = TcpTransport::new();
        transport.close();
        transport.close();
        assert!(!transport.is_connected());
    }

    #[test]
    fn receive_exact_spans_partial_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"ham").unwrap();
            stream.flush().unwrap();
            thread::sleep(std::time::Duration::from_millis(20));
            stream.write_all(b"1abcd").unwrap();
        });

        let mut transport = TcpTransport::new();
        transport
            .connect("127.0.0.1", port, &ClientConfig::default())
            .unwrap();

        let mut buf = [0u8; 8];
        transport.receive_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ham1abcd");

        server.join().unwrap();
        let err = transport.receive_exact(&mut buf).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }
}
