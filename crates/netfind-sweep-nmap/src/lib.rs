// # nmap Host Sweep
//
// This crate provides the nmap-backed HostSweep for netfind.
//
// ## Invocation
//
// Runs `<nmap> <args...> <addr/prefix>` once per interface per round and
// returns stdout untouched; parsing belongs to netfind-core.
//
// ## Failures
//
// Every failure to run the tool, including a binary that disappeared after
// startup, is a `SweepInvocationFailed` for the one interface being swept.
// Missing tools are reported as fatal only by the startup preflight.
//
// ## Cancellation
//
// The child is spawned with `kill_on_drop`, so a sweep abandoned by the
// round (timeout or shutdown) does not leave an nmap process behind.

use netfind_core::config::ToolsConfig;
use netfind_core::net::SweepAddress;
use netfind_core::traits::HostSweep;
use netfind_core::{Error, Result};

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

/// Default arguments: host discovery only, no port scan
const DEFAULT_ARGS: &[&str] = &["-sn"];

/// Host sweep backed by the nmap executable
#[derive(Debug, Clone)]
pub struct NmapSweep {
    /// Executable to run
    binary: PathBuf,

    /// Arguments placed before the target
    args: Vec<String>,
}

impl NmapSweep {
    /// `nmap -sn` from PATH
    pub fn new() -> Self {
        Self::with_command("nmap", DEFAULT_ARGS.iter().map(|arg| arg.to_string()).collect())
    }

    /// Create with an explicit executable and arguments
    ///
    /// # Parameters
    ///
    /// - `binary`: Path or bare name of the executable
    /// - `args`: Arguments passed before the target subnet
    pub fn with_command(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::with_command(tools.nmap.clone(), tools.nmap_args.clone())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for NmapSweep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HostSweep for NmapSweep {
    async fn sweep(&self, target: &SweepAddress) -> Result<String> {
        let target_arg = target.to_string();
        tracing::debug!(
            "Running {} {} {}",
            self.binary.display(),
            self.args.join(" "),
            target_arg
        );

        let output = Command::new(&self.binary)
            .args(&self.args)
            .arg(&target_arg)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::sweep_failed(
                    &target_arg,
                    format!("failed to start {}: {}", self.binary.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::sweep_failed(
                target_arg,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        if !output.stderr.is_empty() {
            tracing::debug!(
                "{} stderr: {}",
                self.binary.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn tool_name(&self) -> &'static str {
        "nmap"
    }
}
