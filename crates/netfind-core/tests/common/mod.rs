//! Test doubles and common utilities for discovery contract tests
//!
//! The doubles replay canned sweep transcripts instead of running nmap, and
//! count how often (and how concurrently) they were called.

#![allow(dead_code)]

use netfind_core::config::NetfindConfig;
use netfind_core::error::{Error, Result};
use netfind_core::net::{Interface, SweepAddress};
use netfind_core::traits::{AddressLookup, HostSweep};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`ScriptedSweep`] does when asked to sweep a target
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this transcript
    Transcript(String),
    /// Fail as if the tool exited non-zero
    Fail(String),
    /// Never answer (until the caller gives up)
    Hang,
    /// Fail as if the tool was uninstalled mid-run
    ToolMissing,
    /// Fail with an error not tied to the target
    Internal(String),
}

/// A HostSweep that replays scripted replies per target
///
/// Each target has a queue of replies; the last reply repeats once the
/// queue is down to one.
pub struct ScriptedSweep {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    delay: Duration,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSweep {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            targets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply for `target` ("a.b.c.d/p")
    pub fn reply(self, target: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a transcript for `target`
    pub fn transcript(self, target: &str, transcript: impl Into<String>) -> Self {
        self.reply(target, Reply::Transcript(transcript.into()))
    }

    /// Sleep this long inside every sweep
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the number of times sweep() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of sweeps observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Targets in the order sweep() was called
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    /// Create a handle that observes the same counters
    pub fn observer(&self) -> SweepObserver {
        SweepObserver {
            call_count: Arc::clone(&self.call_count),
            max_in_flight: Arc::clone(&self.max_in_flight),
            targets: Arc::clone(&self.targets),
        }
    }

    fn next_reply(&self, target: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(target)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// Counters of a [`ScriptedSweep`] that was moved into a round
#[derive(Clone)]
pub struct SweepObserver {
    call_count: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<String>>>,
}

impl SweepObserver {
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl HostSweep for ScriptedSweep {
    async fn sweep(&self, target: &SweepAddress) -> Result<String> {
        let target = target.to_string();
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.next_reply(&target) {
            Some(Reply::Transcript(transcript)) => Ok(transcript),
            Some(Reply::Fail(reason)) => Err(Error::sweep_failed(target, reason)),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some(Reply::ToolMissing) => Err(Error::sweep_failed(
                target,
                "failed to start nmap: No such file or directory (os error 2)",
            )),
            Some(Reply::Internal(reason)) => Err(Error::Other(reason)),
            None => Err(Error::sweep_failed(target, "no scripted reply")),
        }
    }

    fn tool_name(&self) -> &'static str {
        "scripted"
    }
}

/// An AddressLookup backed by a fixed table
pub struct StaticLookup {
    addresses: HashMap<String, std::result::Result<Option<SweepAddress>, String>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self {
            addresses: HashMap::new(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `interface` has address `cidr`
    pub fn assigned(mut self, interface: &str, cidr: &str) -> Self {
        let address = cidr.parse().expect("test CIDR is valid");
        self.addresses.insert(interface.to_string(), Ok(Some(address)));
        self
    }

    /// `interface` exists but has no IPv4 address
    pub fn unassigned(mut self, interface: &str) -> Self {
        self.addresses.insert(interface.to_string(), Ok(None));
        self
    }

    /// Looking up `interface` fails
    pub fn broken(mut self, interface: &str, reason: &str) -> Self {
        self.addresses
            .insert(interface.to_string(), Err(reason.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressLookup for StaticLookup {
    async fn address(&self, interface: &Interface) -> Result<Option<SweepAddress>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.addresses.get(interface.as_str()) {
            Some(Ok(address)) => Ok(*address),
            Some(Err(reason)) => Err(Error::lookup_failed(interface.as_str(), reason.clone())),
            None => Ok(None),
        }
    }
}

/// A host block as it appears in a sweep transcript
pub struct Host {
    name: Option<String>,
    ip: String,
    up: bool,
    mac: Option<(String, String)>,
}

impl Host {
    pub fn up(ip: &str) -> Self {
        Self {
            name: None,
            ip: ip.to_string(),
            up: true,
            mac: None,
        }
    }

    pub fn down(ip: &str) -> Self {
        Self {
            up: false,
            ..Self::up(ip)
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn mac(mut self, mac: &str, vendor: &str) -> Self {
        self.mac = Some((mac.to_string(), vendor.to_string()));
        self
    }

    fn render(&self, out: &mut String) {
        match &self.name {
            Some(name) => out.push_str(&format!("Nmap scan report for {} ({})\n", name, self.ip)),
            None => out.push_str(&format!("Nmap scan report for {}\n", self.ip)),
        }
        if self.up {
            out.push_str("Host is up (0.00050s latency).\n");
        } else {
            out.push_str("Host is down.\n");
        }
        if let Some((mac, vendor)) = &self.mac {
            out.push_str(&format!("MAC Address: {} ({})\n", mac, vendor));
        }
    }
}

/// A complete transcript (banner, host blocks, summary)
pub fn transcript(hosts: &[Host]) -> String {
    let mut out = String::from("Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC\n");
    for host in hosts {
        host.render(&mut out);
    }
    out.push_str(&format!(
        "Nmap done: 256 IP addresses ({} hosts up) scanned in 2.05 seconds\n",
        hosts.iter().filter(|host| host.up).count()
    ));
    out
}

/// A transcript cut off after the given hosts (no summary line)
pub fn truncated_transcript(hosts: &[Host]) -> String {
    let full = transcript(hosts);
    full.lines()
        .filter(|line| !line.starts_with("Nmap done:"))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Helper to create a minimal NetfindConfig for testing
pub fn minimal_config(interfaces: &[&str]) -> NetfindConfig {
    let mut config = NetfindConfig::new(interfaces.iter().copied());
    config.poll.interval_ms = 10;
    config.sweep.timeout_secs = 5;
    config
}
