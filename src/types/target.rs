//! Logical TCP endpoints.

use serde::{Deserialize, Serialize};

/// A logical TCP endpoint packets are sent to.
///
/// Owned by the store; the rest of the harness refers to targets by id.
/// Host and port are fixed once a live connection references the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Store-assigned identity, 0 until created.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Build an unsaved target; the store assigns the id on create.
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self { id: 0, name: name.into(), host: host.into(), port }
    }

    /// `host:port` form used for dialing.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_joins_host_and_port() {
        let target = Target::new("edge", "127.0.0.1", 9000);
        assert_eq!(target.addr(), "127.0.0.1:9000");
        assert_eq!(target.id, 0);
    }
}
