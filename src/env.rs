//! Remote environments.
//!
//! An [`Environment`] is the top-level session with one storage engine
//! instance. [`RemoteEnvironment`] implements it by forwarding every operation
//! to a server over a single connection.
//!
//! # Example
//! ```no_run
//! use ham_remote::{ClientConfig, Environment, RemoteEnvironment};
//!
//! let mut env = RemoteEnvironment::new(ClientConfig::default());
//! env.open("ham://127.0.0.1:8080/test.db", 0).unwrap();
//!
//! let names = env.get_database_names(16).unwrap();
//! println!("databases: {names:?}");
//!
//! env.close(0).unwrap();
//! ```
//!
//! # Design Notes
//!
//! The connection, the open database map and the transaction list live in a
//! session behind a mutex. Database and transaction proxies keep a `Weak`
//! reference to it and go through the same lock, so at most one request is in
//! flight per environment.
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use log::{debug, info};

use crate::{
    Error, Result,
    config::ClientConfig,
    db::RemoteDatabase,
    handle::{DbHandle, EnvHandle, HandleRegistry, TxnHandle},
    param::{self, ParamId, Parameter},
    protocol::{
        ConnectReply, ConnectRequest, Dispatcher, DisconnectReply, DisconnectRequest,
        EnvCreateDbReply, EnvCreateDbRequest, EnvEraseDbReply, EnvEraseDbRequest, EnvFlushReply,
        EnvFlushRequest, EnvGetDatabaseNamesReply, EnvGetDatabaseNamesRequest,
        EnvGetParametersReply, EnvGetParametersRequest, EnvOpenDbReply, EnvOpenDbRequest,
        EnvRenameDbReply, EnvRenameDbRequest, Message, Reply, TcpTransport, Transport,
    },
    txn::{RemoteTransaction, Transaction},
    url::RemoteUrl,
};

/// Operations every environment variant offers.
pub trait Environment {
    type Database;
    type Transaction;

    fn open(&mut self, url: &str, flags: u32) -> Result<()>;

    fn create(
        &mut self,
        url: &str,
        flags: u32,
        mode: u32,
        pagesize: u32,
        cachesize: u64,
        maxdbs: u16,
    ) -> Result<()>;

    /// Closes every open database, then the environment itself.
    fn close(&mut self, flags: u32) -> Result<()>;

    fn rename_db(&self, oldname: u16, newname: u16, flags: u32) -> Result<()>;

    fn erase_db(&self, name: u16, flags: u32) -> Result<()>;

    /// Returns at most `capacity` database names.
    fn get_database_names(&self, capacity: usize) -> Result<Vec<u16>>;

    fn get_parameters(&self, ids: &[ParamId]) -> Result<Vec<Parameter>>;

    fn flush(&self, flags: u32) -> Result<()>;

    fn create_db(&self, name: u16, flags: u32, params: &[(ParamId, u64)])
    -> Result<Self::Database>;

    fn open_db(&self, name: u16, flags: u32, params: &[(ParamId, u64)])
    -> Result<Self::Database>;

    fn txn_begin(&self, name: Option<&str>, flags: u32) -> Result<Self::Transaction>;

    fn txn_commit(&self, txn: &mut Self::Transaction, flags: u32) -> Result<()>;

    fn txn_abort(&self, txn: &mut Self::Transaction, flags: u32) -> Result<()>;
}

/// Connection state shared between an environment and its proxies.
#[derive(Debug)]
pub(crate) struct Session<T: Transport> {
    pub(crate) dispatcher: Dispatcher<T>,
    pub(crate) registry: HandleRegistry,
    pub(crate) databases: BTreeMap<u16, DbHandle>,
    pub(crate) transactions: Vec<TxnHandle>,
    flags: u32,
    url: Option<String>,
}

pub(crate) type SharedSession<T> = Arc<Mutex<Session<T>>>;

pub(crate) fn lock<T: Transport>(session: &Mutex<Session<T>>) -> MutexGuard<'_, Session<T>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn upgrade<T: Transport>(env: &Weak<Mutex<Session<T>>>) -> Result<SharedSession<T>> {
    env.upgrade().ok_or(Error::EnvironmentDropped)
}

impl<T: Transport> Session<T> {
    fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport, config),
            registry: HandleRegistry::new(),
            databases: BTreeMap::new(),
            transactions: Vec::new(),
            flags: 0,
            url: None,
        }
    }

    /// Performs one round trip and checks the reply's status.
    pub(crate) fn call<R: Reply>(&mut self, request: impl Into<Message>) -> Result<R> {
        let request = request.into();
        debug!("dispatching {:?}", request.kind());

        let reply = match self.dispatcher.perform_request(&request) {
            Ok(reply) => reply,
            Err(e) => {
                if !self.dispatcher.is_connected() {
                    self.forget_connection();
                }
                return Err(e);
            }
        };

        let reply = R::try_from(reply)?;
        let status = reply.status();
        if !status.is_success() {
            debug!("{:?} failed: {status}", request.kind());
            return Err(Error::Server(status));
        }
        Ok(reply)
    }

    /// Drops every handle derived from a connection that broke.
    fn forget_connection(&mut self) {
        self.registry.connection_lost();
        self.clear_local_state();
    }

    fn clear_local_state(&mut self) {
        self.databases.clear();
        self.transactions.clear();
        self.url = None;
    }

    fn open(&mut self, url: &str, flags: u32) -> Result<()> {
        let remote = RemoteUrl::parse(url)?;

        if self.dispatcher.is_connected() {
            debug!("dropping previous connection");
            self.dispatcher.close();
        }
        self.registry.reset();
        self.clear_local_state();

        if let Err(e) = self.dispatcher.connect(&remote.host, remote.port) {
            self.dispatcher.close();
            return Err(Error::Network(e));
        }

        let reply: ConnectReply = match self.call(ConnectRequest { path: remote.path }) {
            Ok(reply) => reply,
            Err(e) => {
                self.dispatcher.close();
                return Err(e);
            }
        };

        self.flags = flags | reply.env_flags;
        self.registry.bind_env(reply.env_handle);
        self.url = Some(url.to_string());
        info!("connected to {}:{}", remote.host, remote.port);
        Ok(())
    }

    fn close(&mut self, flags: u32) -> Result<()> {
        let open: Vec<(u16, DbHandle)> = self
            .databases
            .iter()
            .map(|(name, handle)| (*name, *handle))
            .collect();
        for (name, handle) in open {
            self.close_db(name, handle, flags)?;
        }

        let env = self.registry.env()?;
        self.call::<DisconnectReply>(DisconnectRequest {
            env_handle: env.raw(),
        })?;

        self.dispatcher.close();
        self.registry.release_env();
        self.transactions.clear();
        self.url = None;
        info!("disconnected environment {}", env.raw());
        Ok(())
    }

    fn rename_db(&mut self, oldname: u16, newname: u16, flags: u32) -> Result<()> {
        let env = self.registry.env()?;
        self.call::<EnvRenameDbReply>(EnvRenameDbRequest {
            env_handle: env.raw(),
            oldname,
            newname,
            flags,
        })?;
        Ok(())
    }

    fn erase_db(&mut self, name: u16, flags: u32) -> Result<()> {
        let env = self.registry.env()?;
        self.call::<EnvEraseDbReply>(EnvEraseDbRequest {
            env_handle: env.raw(),
            name,
            flags,
        })?;
        Ok(())
    }

    fn flush(&mut self, flags: u32) -> Result<()> {
        let env = self.registry.env()?;
        self.call::<EnvFlushReply>(EnvFlushRequest {
            env_handle: env.raw(),
            flags,
        })?;
        Ok(())
    }

    fn get_database_names(&mut self, capacity: usize) -> Result<Vec<u16>> {
        let env = self.registry.env()?;
        let reply: EnvGetDatabaseNamesReply = self.call(EnvGetDatabaseNamesRequest {
            env_handle: env.raw(),
        })?;

        let mut names = reply.names;
        if names.len() > capacity {
            debug!(
                "server reported {} databases, keeping {capacity}",
                names.len()
            );
            names.truncate(capacity);
        }
        Ok(names)
    }

    fn get_parameters(&mut self, ids: &[ParamId]) -> Result<Vec<Parameter>> {
        let env = self.registry.env()?;
        let reply: EnvGetParametersReply = self.call(EnvGetParametersRequest {
            env_handle: env.raw(),
            names: ids.iter().map(|id| id.0).collect(),
        })?;

        Ok(ids
            .iter()
            .map(|&id| Parameter {
                id,
                value: param::extract(&reply, id),
            })
            .collect())
    }

    fn create_db(
        &mut self,
        name: u16,
        flags: u32,
        params: &[(ParamId, u64)],
    ) -> Result<(DbHandle, u32)> {
        let env = self.registry.env()?;
        let (param_names, param_values): (Vec<u32>, Vec<u64>) =
            params.iter().map(|(id, value)| (id.0, *value)).unzip();

        let reply: EnvCreateDbReply = self.call(EnvCreateDbRequest {
            env_handle: env.raw(),
            dbname: name,
            flags,
            param_names,
            param_values,
        })?;

        let handle = self.register_db(name, reply.db_handle)?;
        Ok((handle, reply.db_flags))
    }

    fn open_db(
        &mut self,
        name: u16,
        flags: u32,
        params: &[(ParamId, u64)],
    ) -> Result<(DbHandle, u32)> {
        if self.databases.contains_key(&name) {
            return Err(Error::DatabaseAlreadyOpen(name));
        }

        let env = self.registry.env()?;
        let (param_names, param_values): (Vec<u32>, Vec<u64>) =
            params.iter().map(|(id, value)| (id.0, *value)).unzip();

        let reply: EnvOpenDbReply = self.call(EnvOpenDbRequest {
            env_handle: env.raw(),
            dbname: name,
            flags,
            param_names,
            param_values,
        })?;

        let handle = self.register_db(name, reply.db_handle)?;
        Ok((handle, reply.db_flags))
    }

    fn register_db(&mut self, name: u16, raw: u64) -> Result<DbHandle> {
        let handle = self.registry.mint_db(raw)?;
        self.databases.insert(name, handle);
        debug!("database {name} open with handle {raw}");
        Ok(handle)
    }
}

/// [`Environment`] backed by a server reachable over a [`Transport`].
#[derive(Debug)]
pub struct RemoteEnvironment<T: Transport = TcpTransport> {
    session: SharedSession<T>,
}

impl RemoteEnvironment<TcpTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(TcpTransport::new(), config)
    }
}

impl Default for RemoteEnvironment<TcpTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport> RemoteEnvironment<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(transport, config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session<T>> {
        lock(&self.session)
    }

    fn downgrade(&self) -> Weak<Mutex<Session<T>>> {
        Arc::downgrade(&self.session)
    }

    /// Caller flags merged with the flags the server reported on connect.
    pub fn flags(&self) -> u32 {
        self.lock().flags
    }

    /// URL of the live connection.
    pub fn url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    pub fn remote_handle(&self) -> Option<EnvHandle> {
        self.lock().registry.env_handle()
    }

    pub fn is_connected(&self) -> bool {
        let session = self.lock();
        session.dispatcher.is_connected() && session.registry.env_handle().is_some()
    }

    /// Names of the databases currently open through this environment.
    pub fn open_databases(&self) -> Vec<u16> {
        self.lock().databases.keys().copied().collect()
    }

    /// Handles of the transactions begun and not yet committed or aborted.
    pub fn transactions(&self) -> Vec<TxnHandle> {
        self.lock().transactions.clone()
    }

    pub fn config(&self) -> ClientConfig {
        self.lock().dispatcher.config().clone()
    }
}

impl<T: Transport> Environment for RemoteEnvironment<T> {
    type Database = RemoteDatabase<T>;
    type Transaction = RemoteTransaction<T>;

    fn open(&mut self, url: &str, flags: u32) -> Result<()> {
        self.lock().open(url, flags)
    }

    /// Creation policy belongs to the server; on the wire this is `open`.
    fn create(
        &mut self,
        url: &str,
        flags: u32,
        mode: u32,
        pagesize: u32,
        cachesize: u64,
        maxdbs: u16,
    ) -> Result<()> {
        debug!(
            "create {url}: mode={mode:o} pagesize={pagesize} cachesize={cachesize} maxdbs={maxdbs} are decided by the server"
        );
        self.open(url, flags)
    }

    fn close(&mut self, flags: u32) -> Result<()> {
        self.lock().close(flags)
    }

    fn rename_db(&self, oldname: u16, newname: u16, flags: u32) -> Result<()> {
        self.lock().rename_db(oldname, newname, flags)
    }

    /// Erasing a database that is still open here is not caught locally.
    fn erase_db(&self, name: u16, flags: u32) -> Result<()> {
        self.lock().erase_db(name, flags)
    }

    fn get_database_names(&self, capacity: usize) -> Result<Vec<u16>> {
        self.lock().get_database_names(capacity)
    }

    fn get_parameters(&self, ids: &[ParamId]) -> Result<Vec<Parameter>> {
        self.lock().get_parameters(ids)
    }

    fn flush(&self, flags: u32) -> Result<()> {
        self.lock().flush(flags)
    }

    fn create_db(
        &self,
        name: u16,
        flags: u32,
        params: &[(ParamId, u64)],
    ) -> Result<RemoteDatabase<T>> {
        let (handle, db_flags) = self.lock().create_db(name, flags, params)?;
        Ok(RemoteDatabase::new(self.downgrade(), name, db_flags, handle))
    }

    fn open_db(
        &self,
        name: u16,
        flags: u32,
        params: &[(ParamId, u64)],
    ) -> Result<RemoteDatabase<T>> {
        let (handle, db_flags) = self.lock().open_db(name, flags, params)?;
        Ok(RemoteDatabase::new(self.downgrade(), name, db_flags, handle))
    }

    fn txn_begin(&self, name: Option<&str>, flags: u32) -> Result<RemoteTransaction<T>> {
        let handle = self.lock().txn_begin(name, flags)?;
        Ok(RemoteTransaction::new(
            self.downgrade(),
            name.map(str::to_string),
            flags,
            handle,
        ))
    }

    fn txn_commit(&self, txn: &mut RemoteTransaction<T>, flags: u32) -> Result<()> {
        self.check_owner(txn)?;
        txn.commit(flags)
    }

    fn txn_abort(&self, txn: &mut RemoteTransaction<T>, flags: u32) -> Result<()> {
        self.check_owner(txn)?;
        txn.abort(flags)
    }
}

impl<T: Transport> RemoteEnvironment<T> {
    fn check_owner(&self, txn: &RemoteTransaction<T>) -> Result<()> {
        if !txn.belongs_to(&self.session) {
            return Err(Error::InvalidParameter(
                "transaction belongs to another environment".to_string(),
            ));
        }
        Ok(())
    }
}
