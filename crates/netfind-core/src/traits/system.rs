// # System Traits
//
// Host-level facts the binary needs before it starts polling: which
// interfaces exist, and whether the process can read link-layer data.
//
// ## Implementations
//
// - NetworkManager (`nmcli device status`) and effective-uid check: `netfind-iface-linux` crate

use async_trait::async_trait;
use serde::Serialize;

/// One row of the interface listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceInfo {
    /// OS interface name (e.g. "eth0")
    pub name: String,
    /// Interface type as reported by the OS (e.g. "ethernet", "wifi")
    pub kind: String,
    /// Connection state (e.g. "connected", "unavailable")
    pub state: String,
    /// Active connection profile, if any
    pub connection: Option<String>,
}

impl InterfaceInfo {
    /// True for "connected" and qualified forms like "connected (externally)"
    pub fn is_connected(&self) -> bool {
        self.state.starts_with("connected")
    }
}

/// Trait for listing network interfaces
#[async_trait]
pub trait InterfaceEnumerator: Send + Sync {
    /// Every interface except loopback, in the order the OS reports them
    async fn interfaces(&self) -> Result<Vec<InterfaceInfo>, crate::Error>;
}

/// Trait for the privilege hint
///
/// Sweeps run unprivileged cannot resolve MAC addresses or manufacturers.
/// The core does not enforce anything based on this; the answer is only
/// surfaced to the operator.
#[async_trait]
pub trait PrivilegeCheck: Send + Sync {
    /// Whether the process runs with elevated rights
    async fn is_privileged(&self) -> Result<bool, crate::Error>;
}
