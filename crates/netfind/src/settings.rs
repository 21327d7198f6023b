//! Runtime settings from the command line, with environment fallbacks

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use netfind_core::config::NetfindConfig;
use netfind_core::traits::InterfaceInfo;
use std::path::PathBuf;
use tracing::Level;

/// How snapshots are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Redrawn table, for a terminal
    Table,
    /// One JSON document per round, for pipes
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "netfind", version)]
#[command(about = "Watch the local network and keep a table of every device seen since startup.")]
pub struct CommandLine {
    /// Interfaces to sweep (default: every connected interface)
    #[arg(value_name = "INTERFACE", env = "NETFIND_INTERFACES", value_delimiter = ',')]
    pub interfaces: Vec<String>,

    /// Time in milliseconds between discoveries
    #[arg(short, long, value_name = "MS", env = "NETFIND_DELAY_MS", default_value_t = 1000)]
    pub delay: u64,

    /// Time budget per interface, in seconds
    #[arg(
        long,
        value_name = "SECS",
        env = "NETFIND_SWEEP_TIMEOUT_SECS",
        default_value_t = 120,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub sweep_timeout: u64,

    /// Interfaces swept at once
    #[arg(
        long,
        value_name = "N",
        env = "NETFIND_MAX_CONCURRENT_SWEEPS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..=64)
    )]
    pub max_concurrent: u16,

    /// Stop after this many rounds (default: run until interrupted)
    #[arg(
        long,
        value_name = "N",
        env = "NETFIND_ROUNDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rounds: Option<u64>,

    /// Stop on the first interface failure
    #[arg(long, env = "NETFIND_ABORT_ON_ERROR", value_parser = BoolishValueParser::new())]
    pub abort_on_error: bool,

    /// nmap executable
    #[arg(long, value_name = "PATH", env = "NETFIND_NMAP_PATH", default_value = "nmap")]
    pub nmap: PathBuf,

    /// Arguments passed to nmap before the subnet
    #[arg(
        long,
        value_name = "ARGS",
        env = "NETFIND_NMAP_ARGS",
        default_value = "-sn",
        allow_hyphen_values = true
    )]
    pub nmap_args: String,

    /// Output format
    #[arg(
        long,
        value_enum,
        env = "NETFIND_OUTPUT",
        default_value_t = OutputMode::Table,
        ignore_case = true
    )]
    pub output: OutputMode,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", env = "NETFIND_LOG_LEVEL", default_value = "warn")]
    pub log_level: Level,
}

/// Application settings
#[derive(Debug)]
pub struct Settings {
    /// Library configuration; `interfaces` holds the requested names until
    /// they are resolved against the machine's interface list
    pub config: NetfindConfig,
    pub output: OutputMode,
    pub log_level: Level,
}

impl CommandLine {
    pub fn parse_args() -> std::result::Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Build the library configuration
    ///
    /// Range checks are done by the parser; what is left is anything it
    /// cannot express.
    pub fn into_settings(self) -> Result<Settings> {
        let requested: Vec<String> = self
            .interfaces
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        for name in &requested {
            if name.contains(char::is_whitespace) || name.contains('/') {
                anyhow::bail!("'{}' is not a valid interface name", name);
            }
        }

        let nmap_args: Vec<String> = self
            .nmap_args
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut config = NetfindConfig::new(requested);
        config.poll.interval_ms = self.delay;
        config.poll.max_rounds = self.rounds;
        config.poll.abort_on_interface_error = self.abort_on_error;
        config.sweep.timeout_secs = self.sweep_timeout;
        config.sweep.max_concurrent = usize::from(self.max_concurrent);
        config.tools.nmap = self.nmap;
        config.tools.nmap_args = nmap_args;

        Ok(Settings {
            config,
            output: self.output,
            log_level: self.log_level,
        })
    }
}

/// Pick the interfaces to poll
///
/// Requested names must exist on the machine; repeats are dropped and the
/// first-mention order kept. With nothing requested, every connected
/// interface is used.
pub fn resolve_interfaces(requested: &[String], available: &[InterfaceInfo]) -> Result<Vec<String>> {
    if requested.is_empty() {
        let connected: Vec<String> = available
            .iter()
            .filter(|info| info.is_connected())
            .map(|info| info.name.clone())
            .collect();

        if connected.is_empty() {
            anyhow::bail!(
                "No connected interfaces found. Name one explicitly: netfind <interface>"
            );
        }
        return Ok(connected);
    }

    let mut resolved: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if !available.iter().any(|info| &info.name == name) {
            let known: Vec<&str> = available.iter().map(|info| info.name.as_str()).collect();
            anyhow::bail!(
                "Interface '{}' does not exist. Available: {}",
                name,
                known.join(", ")
            );
        }
        if !resolved.contains(name) {
            resolved.push(name.clone());
        }
    }

    Ok(resolved)
}
