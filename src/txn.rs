//! Remote transactions.
//!
//! A transaction is begun through [`Environment::txn_begin`] and ends with a
//! successful commit or abort. Until then it is listed in the environment's
//! transaction list. A failed commit or abort leaves it open so the caller can
//! retry.
//!
//! [`Environment::txn_begin`]: crate::Environment::txn_begin
use std::sync::{Arc, Mutex, Weak};

use log::debug;

use crate::{
    Error, Result,
    env::{Session, lock, upgrade},
    handle::TxnHandle,
    protocol::{
        TcpTransport, Transport, TxnAbortReply, TxnAbortRequest, TxnBeginReply, TxnBeginRequest,
        TxnCommitReply, TxnCommitRequest,
    },
};

/// Operations every transaction variant offers.
pub trait Transaction {
    fn name(&self) -> Option<&str>;

    fn flags(&self) -> u32;

    fn commit(&mut self, flags: u32) -> Result<()>;

    fn abort(&mut self, flags: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxnOutcome {
    Commit,
    Abort,
}

#[derive(Debug)]
pub struct RemoteTransaction<T: Transport = TcpTransport> {
    env: Weak<Mutex<Session<T>>>,
    name: Option<String>,
    flags: u32,
    handle: Option<TxnHandle>,
}

impl<T: Transport> RemoteTransaction<T> {
    pub(crate) fn new(
        env: Weak<Mutex<Session<T>>>,
        name: Option<String>,
        flags: u32,
        handle: TxnHandle,
    ) -> Self {
        Self {
            env,
            name,
            flags,
            handle: Some(handle),
        }
    }

    /// Server handle, `None` once committed or aborted.
    pub fn handle(&self) -> Option<TxnHandle> {
        self.handle
    }

    pub(crate) fn belongs_to(&self, session: &Arc<Mutex<Session<T>>>) -> bool {
        std::ptr::eq(self.env.as_ptr(), Arc::as_ptr(session))
    }

    fn finish(&mut self, outcome: TxnOutcome, flags: u32) -> Result<()> {
        let handle = self.handle.ok_or(Error::TransactionClosed)?;
        let env = upgrade(&self.env)?;
        lock(&env).finish_txn(handle, outcome, flags)?;
        self.handle = None;
        Ok(())
    }
}

impl<T: Transport> Transaction for RemoteTransaction<T> {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn commit(&mut self, flags: u32) -> Result<()> {
        self.finish(TxnOutcome::Commit, flags)
    }

    fn abort(&mut self, flags: u32) -> Result<()> {
        self.finish(TxnOutcome::Abort, flags)
    }
}

impl<T: Transport> Session<T> {
    pub(crate) fn txn_begin(&mut self, name: Option<&str>, flags: u32) -> Result<TxnHandle> {
        let env = self.registry.env()?;
        let reply: TxnBeginReply = self.call(TxnBeginRequest {
            env_handle: env.raw(),
            flags,
            name: name.map(str::to_string),
        })?;

        let handle = self.registry.mint_txn(reply.txn_handle)?;
        self.transactions.push(handle);
        debug!("began transaction {}", reply.txn_handle);
        Ok(handle)
    }

    pub(crate) fn finish_txn(
        &mut self,
        handle: TxnHandle,
        outcome: TxnOutcome,
        flags: u32,
    ) -> Result<()> {
        let raw = self.registry.check_txn(handle)?;
        if !self.transactions.contains(&handle) {
            return Err(Error::TransactionClosed);
        }

        match outcome {
            TxnOutcome::Commit => {
                self.call::<TxnCommitReply>(TxnCommitRequest {
                    txn_handle: raw,
                    flags,
                })?;
            }
            TxnOutcome::Abort => {
                self.call::<TxnAbortReply>(TxnAbortRequest {
                    txn_handle: raw,
                    flags,
                })?;
            }
        }

        self.transactions.retain(|t| *t != handle);
        debug!("transaction {raw} finished: {outcome:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ClientConfig, Environment, RemoteEnvironment, Status,
        protocol::{Message, MessageKind},
        testing::{ScriptedTransport, connected_env},
    };

    use super::*;

    fn begin_reply(handle: u64) -> TxnBeginReply {
        TxnBeginReply {
            status: Status::SUCCESS,
            txn_handle: handle,
        }
    }

    #[test]
    fn begin_and_commit() {
        let transport = ScriptedTransport::new();
        let env = connected_env(&transport, 42);
        transport.push_reply(begin_reply(7));

        let mut txn = env.txn_begin(Some("t1"), 0).unwrap();

        assert_eq!(txn.handle().map(TxnHandle::raw), Some(7));
        assert_eq!(txn.name(), Some("t1"));
        assert_eq!(env.transactions(), vec![txn.handle().unwrap()]);
        assert_eq!(
            transport.sent()[1],
            Message::TxnBeginRequest(TxnBeginRequest {
                env_handle: 42,
                flags: 0,
                name: Some("t1".to_string()),
            })
        );

        transport.push_reply(TxnCommitReply {
            status: Status::SUCCESS,
        });
        env.txn_commit(&mut txn, 0).unwrap();

        assert!(env.transactions().is_empty());
        assert_eq!(txn.handle(), None);
        assert_eq!(
            transport.sent()[2],
            Message::TxnCommitRequest(TxnCommitRequest {
                txn_handle: 7,
                flags: 0,
            })
        );
    }

    #[test]
    fn abort_removes_transaction() {
        let transport = ScriptedTransport::new();
        let env = connected_env(&transport, 42);
        transport.push_reply(begin_reply(9));
        let mut txn = env.txn_begin(None, 0x2).unwrap();
        assert_eq!(txn.name(), None);
        assert_eq!(txn.flags(), 0x2);

        transport.push_reply(TxnAbortReply {
            status: Status::SUCCESS,
        });
        txn.abort(0).unwrap();

        assert!(env.transactions().is_empty());
        assert_eq!(
            transport.sent_kinds()[1..],
            [MessageKind::TxnBeginRequest, MessageKind::TxnAbortRequest]
        );
    }

    #[test]
    fn failed_commit_can_be_retried() {
        let transport = ScriptedTransport::new();
        let env = connected_env(&transport, 42);
        transport.push_reply(begin_reply(7));
        let mut txn = env.txn_begin(None, 0).unwrap();

        transport.push_reply(TxnCommitReply {
            status: Status::TXN_CONFLICT,
        });
        let err = txn.commit(0).unwrap_err();
        assert!(matches!(err, Error::Server(Status::TXN_CONFLICT)));
        assert_eq!(env.transactions().len(), 1);
        assert!(txn.handle().is_some());

        transport.push_reply(TxnCommitReply {
            status: Status::SUCCESS,
        });
        txn.commit(0).unwrap();
        assert!(env.transactions().is_empty());
    }

    #[test]
    fn finished_transaction_is_rejected_locally() {
        let transport = ScriptedTransport::new();
        let env = connected_env(&transport, 42);
        transport.push_reply(begin_reply(7));
        let mut txn = env.txn_begin(None, 0).unwrap();
        transport.push_reply(TxnAbortReply {
            status: Status::SUCCESS,
        });
        txn.abort(0).unwrap();
        let calls = transport.calls();

        assert!(matches!(txn.commit(0), Err(Error::TransactionClosed)));
        assert!(matches!(txn.abort(0), Err(Error::TransactionClosed)));
        assert_eq!(transport.calls(), calls);
    }

    #[test]
    fn foreign_transaction_is_rejected() {
        let transport = ScriptedTransport::new();
        let env = connected_env(&transport, 42);
        transport.push_reply(begin_reply(7));
        let mut txn = env.txn_begin(None, 0).unwrap();

        let other = RemoteEnvironment::with_transport(
            ScriptedTransport::new(),
            ClientConfig::default(),
        );
        let err = other.txn_commit(&mut txn, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(env.transactions().len(), 1);
    }
}
