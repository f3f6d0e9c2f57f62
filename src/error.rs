//! Error types for remote environment operations.
use thiserror::Error;

use crate::{
    Status,
    protocol::{ProtocolError, TransportError},
};

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected locally before any network activity.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The connection could not be established.
    #[error("network error: {0}")]
    Network(#[source] TransportError),

    /// Send or receive failed on an established connection. The connection
    /// has been closed.
    #[error("I/O error: {0}")]
    Io(#[source] TransportError),

    #[error("failed to encode request: {0}")]
    Internal(#[from] bincode::error::EncodeError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("environment is not connected")]
    NotConnected,

    #[error("database {0} is already open")]
    DatabaseAlreadyOpen(u16),

    #[error("database {0} is not open")]
    DatabaseNotOpen(u16),

    #[error("transaction is no longer open")]
    TransactionClosed,

    #[error("handle belongs to a closed connection")]
    StaleHandle,

    #[error("environment has been dropped")]
    EnvironmentDropped,

    /// Status reported by the server.
    #[error("server returned {0}")]
    Server(Status),
}

impl Error {
    /// The status code a caller speaking the engine's status codes sees.
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidParameter(_) | Error::TransactionClosed => Status::INV_PARAMETER,
            Error::Network(_) => Status::NETWORK_ERROR,
            Error::Io(_) => Status::IO_ERROR,
            Error::Internal(_) | Error::Protocol(_) => Status::INTERNAL_ERROR,
            Error::NotConnected | Error::StaleHandle | Error::EnvironmentDropped => {
                Status::NOT_INITIALIZED
            }
            Error::DatabaseAlreadyOpen(_) => Status::DATABASE_ALREADY_OPEN,
            Error::DatabaseNotOpen(_) => Status::DATABASE_NOT_FOUND,
            Error::Server(status) => *status,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
