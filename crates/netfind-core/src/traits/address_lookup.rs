// # Address Lookup Trait
//
// Resolves the subnet currently assigned to an interface.
//
// ## Implementations
//
// - iproute2 (`ip -4 address show dev <iface>`): `netfind-iface-linux` crate

use async_trait::async_trait;

use crate::net::{Interface, SweepAddress};

/// Trait for interface address lookups
///
/// Called once per interface per round: interfaces are re-addressed by
/// DHCP, brought down, or re-plugged between rounds.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Current CIDR address of `interface`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(address))`: The interface has an address to sweep
    /// - `Ok(None)`: No address assigned (link down, no lease yet)
    /// - `Err(Error)`: The lookup itself failed
    async fn address(&self, interface: &Interface) -> Result<Option<SweepAddress>, crate::Error>;
}
