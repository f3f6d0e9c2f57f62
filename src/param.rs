//! Environment parameters that can be queried from the server.
use std::{fmt, str::FromStr};

use log::{debug, warn};

use crate::{Error, protocol::EnvGetParametersReply};

/// Numeric parameter identifier as used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

impl ParamId {
    pub const CACHE_SIZE: ParamId = ParamId(0x100);
    pub const PAGE_SIZE: ParamId = ParamId(0x101);
    pub const KEY_SIZE: ParamId = ParamId(0x102);
    pub const MAX_DATABASES: ParamId = ParamId(0x103);
    pub const FLAGS: ParamId = ParamId(0x200);
    pub const FILE_MODE: ParamId = ParamId(0x201);
    pub const FILE_NAME: ParamId = ParamId(0x202);

    const NAMED: [(ParamId, &'static str); 7] = [
        (Self::CACHE_SIZE, "cachesize"),
        (Self::PAGE_SIZE, "pagesize"),
        (Self::KEY_SIZE, "keysize"),
        (Self::MAX_DATABASES, "max_databases"),
        (Self::FLAGS, "flags"),
        (Self::FILE_MODE, "filemode"),
        (Self::FILE_NAME, "filename"),
    ];

    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(id, _)| *id == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

impl FromStr for ParamId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((id, _)) = Self::NAMED.iter().find(|(_, name)| name.eq_ignore_ascii_case(s)) {
            return Ok(*id);
        }

        let parsed = match s.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        parsed
            .map(ParamId)
            .map_err(|_| Error::InvalidParameter(format!("unknown parameter '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(u64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

/// One requested parameter and, if the server supplied it, its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub id: ParamId,
    pub value: Option<ParamValue>,
}

impl Parameter {
    pub fn as_u64(&self) -> Option<u64> {
        match self.value {
            Some(ParamValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(ParamValue::Text(v)) => Some(v),
            _ => None,
        }
    }
}

/// Picks the value for `id` out of a reply. Ids this client does not know
/// are logged and left unset.
pub(crate) fn extract(reply: &EnvGetParametersReply, id: ParamId) -> Option<ParamValue> {
    let value = match id {
        ParamId::CACHE_SIZE => reply.cachesize.map(ParamValue::Int),
        ParamId::PAGE_SIZE => reply.pagesize.map(|v| ParamValue::Int(v.into())),
        ParamId::MAX_DATABASES => reply.max_env_databases.map(|v| ParamValue::Int(v.into())),
        ParamId::FLAGS => reply.flags.map(|v| ParamValue::Int(v.into())),
        ParamId::FILE_MODE => reply.filemode.map(|v| ParamValue::Int(v.into())),
        ParamId::FILE_NAME => reply.filename.clone().map(ParamValue::Text),
        ParamId::KEY_SIZE => None,
        other => {
            warn!("unknown parameter {other}");
            return None;
        }
    };

    if value.is_none() {
        debug!("server did not report parameter {id}");
    }
    value
}

#[cfg(test)]
mod tests {
    use crate::Status;

    use super::*;

    #[test]
    fn parse_names_and_numbers() {
        assert_eq!("cachesize".parse::<ParamId>().unwrap(), ParamId::CACHE_SIZE);
        assert_eq!("FileName".parse::<ParamId>().unwrap(), ParamId::FILE_NAME);
        assert_eq!("0x201".parse::<ParamId>().unwrap(), ParamId::FILE_MODE);
        assert_eq!("999".parse::<ParamId>().unwrap(), ParamId(999));
        assert!("bogus".parse::<ParamId>().is_err());
    }

    #[test]
    fn extract_known_values() {
        let reply = EnvGetParametersReply {
            status: Status::SUCCESS,
            cachesize: Some(1024),
            pagesize: Some(4096),
            filename: Some("test.db".to_string()),
            ..Default::default()
        };

        assert_eq!(
            extract(&reply, ParamId::CACHE_SIZE),
            Some(ParamValue::Int(1024))
        );
        assert_eq!(
            extract(&reply, ParamId::PAGE_SIZE),
            Some(ParamValue::Int(4096))
        );
        assert_eq!(
            extract(&reply, ParamId::FILE_NAME),
            Some(ParamValue::Text("test.db".to_string()))
        );
        assert_eq!(extract(&reply, ParamId::FLAGS), None);
    }

    #[test]
    fn extract_skips_unknown_ids() {
        let reply = EnvGetParametersReply::default();
        assert_eq!(extract(&reply, ParamId(0x9999)), None);
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(ParamId::MAX_DATABASES.to_string(), "max_databases");
        assert_eq!(ParamId(0x9999).to_string(), "0x9999");
    }
}
