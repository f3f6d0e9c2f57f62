//! Client configuration.
use std::time::Duration;

/// Upper bound for a single reply payload.
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// Settings shared by every connection an environment makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bound on establishing the socket. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Bound on each blocking read of a reply. `None` waits forever, so a
    /// server that accepts but never answers will hang the caller.
    pub read_timeout: Option<Duration>,
    /// Reply frames declaring a larger payload are rejected.
    pub max_payload_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_max_payload_size(mut self, size: u32) -> Self {
        self.max_payload_size = size;
        self
    }
}
