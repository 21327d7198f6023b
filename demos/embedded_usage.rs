//! Minimal embedding example for netfind-core
//!
//! This example drives the poll loop from a custom application with a
//! replayed sweep instead of nmap, so it runs anywhere without root.
//! The loop lifecycle is fully managed by the application.

use netfind_core::{
    AddressLookup, DeviceEntry, DiscoveryRound, HostSweep, Interface, NetfindConfig, PollLoop,
    Result, RoundReport, SweepAddress,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

const ROUND_1: &str = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC
Nmap scan report for router.lan (192.168.1.1)
Host is up (0.00031s latency).
MAC Address: 00:11:22:33:44:55 (Netgear)
Nmap scan report for laptop.lan (192.168.1.20)
Host is up (0.0012s latency).
MAC Address: 3C:22:FB:01:02:03 (Apple)
Nmap done: 256 IP addresses (2 hosts up) scanned in 2.05 seconds
";

// The laptop is not reported at all: it stays listed as tentatively down
const ROUND_2: &str = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC
Nmap scan report for router.lan (192.168.1.1)
Host is up (0.00029s latency).
MAC Address: 00:11:22:33:44:55 (Netgear)
Nmap scan report for 192.168.1.42
Host is up (0.0020s latency).
MAC Address: B8:27:EB:AA:BB:CC (Raspberry Pi Foundation)
Nmap done: 256 IP addresses (2 hosts up) scanned in 2.01 seconds
";

// The laptop is back on a new address
const ROUND_3: &str = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC
Nmap scan report for router.lan (192.168.1.1)
Host is up (0.00030s latency).
MAC Address: 00:11:22:33:44:55 (Netgear)
Nmap scan report for laptop.lan (192.168.1.21)
Host is up (0.0009s latency).
MAC Address: 3C:22:FB:01:02:03 (Apple)
Nmap done: 256 IP addresses (2 hosts up) scanned in 1.98 seconds
";

/// Address lookup for a single fixed network
struct FixedLookup {
    address: SweepAddress,
}

#[async_trait::async_trait]
impl AddressLookup for FixedLookup {
    async fn address(&self, _interface: &Interface) -> Result<Option<SweepAddress>> {
        Ok(Some(self.address))
    }
}

/// Sweep that replays canned transcripts, one per call
struct ReplayedSweep {
    transcripts: Vec<&'static str>,
    calls: AtomicUsize,
}

impl ReplayedSweep {
    fn new(transcripts: Vec<&'static str>) -> Self {
        Self {
            transcripts,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl HostSweep for ReplayedSweep {
    async fn sweep(&self, target: &SweepAddress) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.transcripts.len().saturating_sub(1));
        println!("[Embedded] Sweeping {} (replay {})", target, index + 1);
        Ok(self
            .transcripts
            .get(index)
            .map(|transcript| transcript.to_string())
            .unwrap_or_default())
    }

    fn tool_name(&self) -> &'static str {
        "replay"
    }
}

fn print_snapshot(snapshot: &[DeviceEntry], report: &RoundReport) {
    println!(
        "\n[Snapshot] {} record(s) applied, {} device(s) known",
        report.records_applied(),
        snapshot.len()
    );
    for entry in snapshot {
        println!(
            "  {:<18} {:<6} {:<15} {}",
            entry
                .mac
                .map(|mac| mac.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.status.to_string(),
            entry.ip.to_string(),
            entry.hostname.as_deref().unwrap_or("")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded netfind-core Example ===\n");

    let mut config = NetfindConfig::new(["eth0"]);
    config.poll.interval_ms = 100;
    config.poll.max_rounds = Some(3);

    let lookup = Arc::new(FixedLookup {
        address: "192.168.1.0/24".parse()?,
    });
    let sweep = Arc::new(ReplayedSweep::new(vec![ROUND_1, ROUND_2, ROUND_3]));

    println!("1. Creating poll loop...");
    let round = DiscoveryRound::new(lookup, sweep, &config);
    let (mut poll_loop, events) = PollLoop::new(round, &config)?;

    let event_listener = tokio::spawn(async move {
        let mut events = ReceiverStream::new(events);
        while let Some(event) = events.next().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Running three rounds...");
    let reason = poll_loop.run(print_snapshot).await?;

    // Dropping the loop closes the event channel
    drop(poll_loop);
    let _ = event_listener.await;

    println!("\n3. Poll loop stopped: {}", reason);
    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Loop lifecycle is controlled by the application");
    println!("- Sweeps and address lookups are pluggable");
    println!("- Devices missing from a round are kept, marked \"down?\"");

    Ok(())
}
