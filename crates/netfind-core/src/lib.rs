// # netfind-core
//
// Core library for LAN device discovery.
//
// ## Architecture Overview
//
// This library turns periodic host sweeps into a live device table:
// - **HostSweep**: Trait for enumerating live hosts on a subnet (nmap transcript)
// - **AddressLookup**: Trait for finding the subnet assigned to an interface
// - **parse_sweep**: Pure parser from sweep transcript to discovery records
// - **DeviceRegistry**: Reconciles records into one entry per physical device
// - **DiscoveryRound**: One polling cycle over all configured interfaces
// - **PollLoop**: Repeats rounds on an interval until cancelled
//
// ## Design Principles
//
// 1. **Separation of Concerns**: No process spawning in this crate; tools live behind traits
// 2. **Interface Isolation**: One interface failing never stops the others
// 3. **Single Writer**: Only the loop's task mutates the registry
// 4. **Library-First**: The binary is a thin shell over these types

pub mod traits;
pub mod engine;
pub mod registry;
pub mod parser;
pub mod device;
pub mod net;
pub mod config;
pub mod error;
pub mod preflight;

// Re-export core types for convenience
pub use traits::{AddressLookup, HostSweep, InterfaceEnumerator, InterfaceInfo, PrivilegeCheck};
pub use engine::{
    DiscoveryRound, InterfaceOutcome, InterfaceReport, PollEvent, PollLoop, RoundReport,
    StopReason,
};
pub use registry::{ApplyOutcome, DeviceRegistry, StatusCounts};
pub use parser::{parse_sweep, ParseError, ParseErrorKind};
pub use device::{DeviceEntry, DeviceKey, DeviceStatus, DiscoveryRecord, HostState};
pub use net::{Interface, MacAddr, SweepAddress};
pub use config::{NetfindConfig, PollConfig, SweepConfig, ToolsConfig};
pub use error::{Error, Result};
