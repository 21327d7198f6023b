//! Configuration types for netfind
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main netfind configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetfindConfig {
    /// Interfaces to sweep each round (e.g. ["eth0", "wlan0"])
    pub interfaces: Vec<String>,

    /// Polling loop settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Per-sweep settings
    #[serde(default)]
    pub sweep: SweepConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl NetfindConfig {
    /// Create a configuration with defaults for the given interfaces
    pub fn new<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interfaces: interfaces.into_iter().map(Into::into).collect(),
            poll: PollConfig::default(),
            sweep: SweepConfig::default(),
            tools: ToolsConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interfaces.is_empty() {
            return Err(crate::Error::config("No interfaces configured"));
        }

        let mut seen = HashSet::new();
        for name in &self.interfaces {
            if name.trim().is_empty() {
                return Err(crate::Error::config("Interface name cannot be empty"));
            }
            if name.contains(char::is_whitespace) || name.contains('/') {
                return Err(crate::Error::config(format!(
                    "Interface name '{}' is not a valid OS interface name",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Interface '{}' is listed more than once",
                    name
                )));
            }
        }

        self.poll.validate()?;
        self.sweep.validate()?;
        self.tools.validate()?;

        Ok(())
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between the end of one round and the start of the next (ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Capacity of the poll event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// stalling the loop.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Stop after this many rounds (None = run until cancelled)
    #[serde(default)]
    pub max_rounds: Option<u64>,

    /// Treat any per-interface failure as fatal for the whole loop
    #[serde(default)]
    pub abort_on_interface_error: bool,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.max_rounds == Some(0) {
            return Err(crate::Error::config("max_rounds must be > 0 when set"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            max_rounds: None,
            abort_on_interface_error: false,
        }
    }
}

/// Sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Time budget for one interface (lookup + sweep), in seconds
    #[serde(default = "default_sweep_timeout_secs")]
    pub timeout_secs: u64,

    /// How many interfaces may be swept at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Apply the records parsed before a transcript turned out malformed
    #[serde(default = "default_apply_partial_results")]
    pub apply_partial_results: bool,
}

impl SweepConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Sweep timeout must be > 0"));
        }
        if self.max_concurrent == 0 {
            return Err(crate::Error::config("Sweep concurrency must be > 0"));
        }
        Ok(())
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_sweep_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            apply_partial_results: default_apply_partial_results(),
        }
    }
}

/// Locations and arguments of the external tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Host sweep executable
    #[serde(default = "default_nmap")]
    pub nmap: PathBuf,

    /// Arguments passed before the target subnet
    #[serde(default = "default_nmap_args")]
    pub nmap_args: Vec<String>,

    /// Address lookup executable
    #[serde(default = "default_ip")]
    pub ip: PathBuf,

    /// Interface listing executable
    #[serde(default = "default_nmcli")]
    pub nmcli: PathBuf,
}

impl ToolsConfig {
    /// Every executable that must be present before polling starts
    pub fn required(&self) -> Vec<&std::path::Path> {
        vec![self.nmap.as_path(), self.ip.as_path(), self.nmcli.as_path()]
    }

    fn validate(&self) -> Result<(), crate::Error> {
        for tool in self.required() {
            if tool.as_os_str().is_empty() {
                return Err(crate::Error::config("Tool path cannot be empty"));
            }
        }
        Ok(())
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            nmap: default_nmap(),
            nmap_args: default_nmap_args(),
            ip: default_ip(),
            nmcli: default_nmcli(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_sweep_timeout_secs() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    1
}

fn default_apply_partial_results() -> bool {
    true
}

fn default_nmap() -> PathBuf {
    PathBuf::from("nmap")
}

fn default_nmap_args() -> Vec<String> {
    vec!["-sn".to_string()]
}

fn default_ip() -> PathBuf {
    PathBuf::from("ip")
}

fn default_nmcli() -> PathBuf {
    PathBuf::from("nmcli")
}
