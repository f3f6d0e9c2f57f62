//! Status codes exchanged with the remote engine.
//!
//! Every reply carries a [`Status`]. Zero is success; every other value is an
//! engine-defined failure that is passed through to the caller verbatim.
use std::fmt;

use bincode::{Decode, Encode};

/// Numeric status code as carried on the wire. Defaults to success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Status(pub i32);

impl Status {
    pub const SUCCESS: Status = Status(0);
    pub const NOT_INITIALIZED: Status = Status(-7);
    pub const INV_PARAMETER: Status = Status(-8);
    pub const KEY_NOT_FOUND: Status = Status(-11);
    pub const INTERNAL_ERROR: Status = Status(-14);
    pub const IO_ERROR: Status = Status(-18);
    pub const NOT_IMPLEMENTED: Status = Status(-20);
    pub const FILE_NOT_FOUND: Status = Status(-21);
    pub const TXN_CONFLICT: Status = Status(-31);
    pub const TXN_STILL_OPEN: Status = Status(-33);
    pub const DATABASE_NOT_FOUND: Status = Status(-200);
    pub const DATABASE_ALREADY_EXISTS: Status = Status(-201);
    pub const DATABASE_ALREADY_OPEN: Status = Status(-202);
    pub const ENVIRONMENT_ALREADY_OPEN: Status = Status(-203);
    pub const NETWORK_ERROR: Status = Status(-400);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Short description for the known codes.
    pub fn description(self) -> Option<&'static str> {
        let text = match self {
            Self::SUCCESS => "success",
            Self::NOT_INITIALIZED => "object not initialized",
            Self::INV_PARAMETER => "invalid parameter",
            Self::KEY_NOT_FOUND => "key not found",
            Self::INTERNAL_ERROR => "internal error",
            Self::IO_ERROR => "system I/O error",
            Self::NOT_IMPLEMENTED => "operation not implemented",
            Self::FILE_NOT_FOUND => "file not found",
            Self::TXN_CONFLICT => "transaction conflict",
            Self::TXN_STILL_OPEN => "transaction still open",
            Self::DATABASE_NOT_FOUND => "database not found",
            Self::DATABASE_ALREADY_EXISTS => "database already exists",
            Self::DATABASE_ALREADY_OPEN => "database already open",
            Self::ENVIRONMENT_ALREADY_OPEN => "environment already open",
            Self::NETWORK_ERROR => "network error",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(text) => write!(f, "{text} ({})", self.0),
            None => write!(f, "unknown status ({})", self.0),
        }
    }
}

impl From<i32> for Status {
    fn from(value: i32) -> Self {
        Status(value)
    }
}
