use bincode::{Decode, Encode};

use crate::Status;

use super::{Message, ProtocolError};

/// A reply body. Every reply carries the server's status for the request.
pub trait Reply: TryFrom<Message, Error = ProtocolError> {
    fn status(&self) -> Status;
}

macro_rules! status_only_replies {
    ($($reply:ident),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
            pub struct $reply {
                pub status: Status,
            }
        )+
    };
}

status_only_replies!(
    DisconnectReply,
    EnvRenameDbReply,
    EnvEraseDbReply,
    EnvFlushReply,
    DbCloseReply,
    TxnCommitReply,
    TxnAbortReply,
);

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct ConnectReply {
    pub status: Status,
    pub env_flags: u32,
    pub env_handle: u64,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvGetDatabaseNamesReply {
    pub status: Status,
    pub names: Vec<u16>,
}

/// Only the fields the client asked for are expected to be set.
#[derive(Debug, Clone, Default, Encode, Decode, PartialEq, Eq)]
pub struct EnvGetParametersReply {
    pub status: Status,
    pub cachesize: Option<u64>,
    pub pagesize: Option<u32>,
    pub max_env_databases: Option<u32>,
    pub flags: Option<u32>,
    pub filemode: Option<u32>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvCreateDbReply {
    pub status: Status,
    pub db_flags: u32,
    pub db_handle: u64,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvOpenDbReply {
    pub status: Status,
    pub db_flags: u32,
    pub db_handle: u64,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct TxnBeginReply {
    pub status: Status,
    pub txn_handle: u64,
}
