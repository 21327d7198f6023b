// # Host Sweep Trait
//
// Defines the interface for enumerating live hosts on a subnet.
//
// ## Implementations
//
// - nmap ping scan: `netfind-sweep-nmap` crate
//
// ## Usage
//
// ```rust,ignore
// use netfind_core::{HostSweep, SweepAddress, parser};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let sweep = /* HostSweep implementation */;
//
//     let transcript = sweep.sweep(&"192.168.1.10/24".parse()?).await?;
//     for record in parser::parse_sweep(&transcript)? {
//         println!("{} is {:?}", record.ip, record.status);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::net::SweepAddress;

/// Trait for host sweep implementations
///
/// A sweep pings every address of one subnet and returns the tool's raw
/// transcript. Interpreting the transcript is the job of
/// [`crate::parser`], never of the sweep.
///
/// # Contract
///
/// - Must sweep the address it is given; never a cached subnet
/// - May take several seconds; the caller bounds it with a timeout and
///   drops the future when the budget runs out, so implementations must
///   be cancellation-safe (no orphaned child processes)
/// - A tool that cannot be started or exits abnormally is an
///   [`Error::SweepInvocationFailed`](crate::Error::SweepInvocationFailed)
/// - No retries: the next round is the retry
#[async_trait]
pub trait HostSweep: Send + Sync {
    /// Sweep `target` and return the raw transcript
    async fn sweep(&self, target: &SweepAddress) -> Result<String, crate::Error>;

    /// Name of the underlying tool (for logging/debugging)
    fn tool_name(&self) -> &'static str;
}
