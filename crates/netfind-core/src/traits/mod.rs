//! Collaborator traits for netfind
//!
//! The core never runs external programs itself; it talks to these seams.
//!
//! - [`HostSweep`]: Enumerate live hosts on a subnet
//! - [`AddressLookup`]: Find the subnet currently assigned to an interface
//! - [`InterfaceEnumerator`]: List the machine's network interfaces
//! - [`PrivilegeCheck`]: Whether link-layer data will be available

pub mod host_sweep;
pub mod address_lookup;
pub mod system;

pub use host_sweep::HostSweep;
pub use address_lookup::AddressLookup;
pub use system::{InterfaceEnumerator, InterfaceInfo, PrivilegeCheck};
