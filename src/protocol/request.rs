use bincode::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct ConnectRequest {
    pub path: String,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct DisconnectRequest {
    pub env_handle: u64,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvRenameDbRequest {
    pub env_handle: u64,
    pub oldname: u16,
    pub newname: u16,
    pub flags: u32,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvEraseDbRequest {
    pub env_handle: u64,
    pub name: u16,
    pub flags: u32,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvGetDatabaseNamesRequest {
    pub env_handle: u64,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvGetParametersRequest {
    pub env_handle: u64,
    pub names: Vec<u32>,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvFlushRequest {
    pub env_handle: u64,
    pub flags: u32,
}

/// Shared by `ENV_CREATE_DB` and `ENV_OPEN_DB`; `param_names` and
/// `param_values` are parallel.
#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvCreateDbRequest {
    pub env_handle: u64,
    pub dbname: u16,
    pub flags: u32,
    pub param_names: Vec<u32>,
    pub param_values: Vec<u64>,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct EnvOpenDbRequest {
    pub env_handle: u64,
    pub dbname: u16,
    pub flags: u32,
    pub param_names: Vec<u32>,
    pub param_values: Vec<u64>,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct DbCloseRequest {
    pub db_handle: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct TxnBeginRequest {
    pub env_handle: u64,
    pub flags: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct TxnCommitRequest {
    pub txn_handle: u64,
    pub flags: u32,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct TxnAbortRequest {
    pub txn_handle: u64,
    pub flags: u32,
}
