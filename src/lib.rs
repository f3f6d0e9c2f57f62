//! Client for environments served over the `ham://` remote protocol.
//!
//! A [`RemoteEnvironment`] connects to a server, then forwards environment,
//! database and transaction operations to it as framed request/reply pairs.
//! Every request blocks until its reply arrives and server status codes come
//! back as [`Error::Server`].
pub mod cli;
pub mod config;
pub mod db;
pub mod env;
pub mod error;
pub mod handle;
pub mod param;
pub mod protocol;
pub mod status;
pub mod txn;
pub mod url;

#[cfg(test)]
mod testing;

pub use cli::{Command, CommandError, prompt};
pub use config::ClientConfig;
pub use db::{Database, RemoteDatabase};
pub use env::{Environment, RemoteEnvironment};
pub use error::{Error, Result};
pub use handle::{DbHandle, EnvHandle, TxnHandle};
pub use param::{ParamId, ParamValue, Parameter};
pub use status::Status;
pub use txn::{RemoteTransaction, Transaction};
pub use url::RemoteUrl;
