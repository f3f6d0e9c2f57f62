//! Server-issued handles and the registry that scopes them to a connection.
//!
//! The server identifies environments, databases and transactions by opaque
//! 64-bit numbers that only mean something on the connection that issued
//! them. Locally each number is wrapped in a typed handle stamped with the
//! connection epoch it was minted in, so a handle from a previous connection
//! is caught before it reaches the wire.
use log::{debug, info, warn};

use crate::{Error, Result};

macro_rules! remote_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            raw: u64,
            epoch: u64,
        }

        impl $name {
            /// The identifier as issued by the server.
            pub fn raw(self) -> u64 {
                self.raw
            }
        }
    };
}

remote_handle!(
    /// Handle of a connected environment.
    EnvHandle
);
remote_handle!(
    /// Handle of an open database.
    DbHandle
);
remote_handle!(
    /// Handle of a running transaction.
    TxnHandle
);

/// The only place handles are minted and invalidated.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    epoch: u64,
    env: Option<EnvHandle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the environment handle from a successful CONNECT reply and
    /// starts a new epoch.
    pub fn bind_env(&mut self, raw: u64) -> EnvHandle {
        self.epoch += 1;
        let handle = EnvHandle {
            raw,
            epoch: self.epoch,
        };
        self.env = Some(handle);
        info!("bound environment handle {raw}");
        handle
    }

    /// Invalidates every handle after a successful DISCONNECT.
    pub fn release_env(&mut self) {
        self.epoch += 1;
        self.env = None;
    }

    /// Invalidates every handle after the connection broke.
    pub fn connection_lost(&mut self) {
        if let Some(env) = self.env.take() {
            warn!("connection lost; environment handle {} invalidated", env.raw);
        }
        self.epoch += 1;
    }

    /// Invalidates every handle before the environment deliberately opens a
    /// new connection.
    pub fn reset(&mut self) {
        if let Some(env) = self.env.take() {
            debug!("releasing environment handle {} for reconnect", env.raw);
        }
        self.epoch += 1;
    }

    pub fn env_handle(&self) -> Option<EnvHandle> {
        self.env
    }

    /// The environment handle, required before any handle-bearing request.
    pub fn env(&self) -> Result<EnvHandle> {
        self.env.ok_or(Error::NotConnected)
    }

    pub fn mint_db(&self, raw: u64) -> Result<DbHandle> {
        self.env()?;
        Ok(DbHandle {
            raw,
            epoch: self.epoch,
        })
    }

    pub fn mint_txn(&self, raw: u64) -> Result<TxnHandle> {
        self.env()?;
        Ok(TxnHandle {
            raw,
            epoch: self.epoch,
        })
    }

    /// Validates a database handle against the live connection.
    pub fn check_db(&self, handle: DbHandle) -> Result<u64> {
        self.check_epoch(handle.epoch)?;
        Ok(handle.raw)
    }

    /// Validates a transaction handle against the live connection.
    pub fn check_txn(&self, handle: TxnHandle) -> Result<u64> {
        self.check_epoch(handle.epoch)?;
        Ok(handle.raw)
    }

    fn check_epoch(&self, epoch: u64) -> Result<()> {
        self.env()?;
        if epoch != self.epoch {
            return Err(Error::StaleHandle);
        }
        Ok(())
    }
}
