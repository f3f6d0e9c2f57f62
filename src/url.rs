//! Remote environment URLs: `ham://host:port[/path]`.
use log::trace;

use crate::{Error, Result};

pub const SCHEME: &str = "ham://";

/// Components of a remote environment URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub port: u16,
    /// Server-side path, starting at the `/` that follows the port. Empty
    /// when the URL carries no path.
    pub path: String,
}

impl RemoteUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| invalid(url, "expected `ham://<host>:<port>`"))?;

        let (host, rest) = rest
            .split_once(':')
            .ok_or_else(|| invalid(url, "missing port"))?;
        if host.is_empty() {
            return Err(invalid(url, "missing host"));
        }

        let (port, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        let port = match port.parse::<u16>() {
            Ok(0) | Err(_) => return Err(invalid(url, "invalid port")),
            Ok(port) => port,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

fn invalid(url: &str, reason: &str) -> Error {
    trace!("rejecting url '{url}': {reason}");
    Error::InvalidParameter(format!("{reason} in '{url}'"))
}
