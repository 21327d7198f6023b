// # Linux Interface Tools
//
// This crate backs netfind's host-level traits with standard Linux tools.
//
// ## Components
//
// - [`IpAddressLookup`]: `ip -4 address show dev <iface>` (iproute2)
// - [`NmcliEnumerator`]: `nmcli device status` (NetworkManager)
// - [`RootPrivilegeCheck`]: effective uid via the `is-root` crate
//
// ## Locale
//
// Tools run with `LC_ALL=C` so column headers and state words are stable.

mod address;
mod nmcli;
mod privilege;

pub use address::{IpAddressLookup, parse_inet_address};
pub use nmcli::{NmcliEnumerator, parse_device_status};
pub use privilege::RootPrivilegeCheck;

use netfind_core::Result;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Run a tool to completion with a fixed locale
///
/// A binary that cannot be started is an `Error::Io`; callers decide
/// whether that is fatal. Missing tools are reported as such only by the
/// startup preflight.
async fn run_tool(binary: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(binary)
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;
    Ok(output)
}
