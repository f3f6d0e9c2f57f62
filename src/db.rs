//! Database proxies.
use std::sync::{Mutex, Weak};

use log::debug;

use crate::{
    Error, Result,
    env::{Session, lock, upgrade},
    handle::DbHandle,
    protocol::{DbCloseReply, DbCloseRequest, TcpTransport, Transport},
};

/// Operations every database variant offers.
pub trait Database {
    fn name(&self) -> u16;

    fn flags(&self) -> u32;

    fn close(&mut self, flags: u32) -> Result<()>;
}

/// A database opened through a [`RemoteEnvironment`](crate::RemoteEnvironment).
///
/// The proxy does not keep the environment alive; once the environment is
/// dropped every operation fails with [`Error::EnvironmentDropped`].
#[derive(Debug)]
pub struct RemoteDatabase<T: Transport = TcpTransport> {
    env: Weak<Mutex<Session<T>>>,
    name: u16,
    flags: u32,
    handle: Option<DbHandle>,
}

impl<T: Transport> RemoteDatabase<T> {
    pub(crate) fn new(
        env: Weak<Mutex<Session<T>>>,
        name: u16,
        flags: u32,
        handle: DbHandle,
    ) -> Self {
        Self {
            env,
            name,
            flags,
            handle: Some(handle),
        }
    }

    /// Server handle, `None` once this proxy has been closed.
    pub fn handle(&self) -> Option<DbHandle> {
        self.handle
    }
}

impl<T: Transport> Database for RemoteDatabase<T> {
    fn name(&self) -> u16 {
        self.name
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn close(&mut self, flags: u32) -> Result<()> {
        let handle = self.handle.ok_or(Error::DatabaseNotOpen(self.name))?;
        let env = upgrade(&self.env)?;
        lock(&env).close_db(self.name, handle, flags)?;
        self.handle = None;
        Ok(())
    }
}

impl<T: Transport> Session<T> {
    /// Closes one database and removes it from the open database map.
    pub(crate) fn close_db(&mut self, name: u16, handle: DbHandle, flags: u32) -> Result<()> {
        let raw = self.registry.check_db(handle)?;
        if self.databases.get(&name) != Some(&handle) {
            return Err(Error::DatabaseNotOpen(name));
        }

        self.call::<DbCloseReply>(DbCloseRequest {
            db_handle: raw,
            flags,
        })?;
        self.databases.remove(&name);
        debug!("closed database {name}");
        Ok(())
    }
}
