//! Interface listing via NetworkManager

use netfind_core::config::ToolsConfig;
use netfind_core::traits::{InterfaceEnumerator, InterfaceInfo};
use netfind_core::{Error, Result};
use std::path::PathBuf;

/// InterfaceEnumerator backed by `nmcli device status`
#[derive(Debug, Clone)]
pub struct NmcliEnumerator {
    binary: PathBuf,
}

impl NmcliEnumerator {
    pub fn new() -> Self {
        Self::with_binary("nmcli")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::with_binary(tools.nmcli.clone())
    }
}

impl Default for NmcliEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InterfaceEnumerator for NmcliEnumerator {
    async fn interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        let output = super::run_tool(&self.binary, &["device", "status"]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Other(format!(
                "{} device status failed ({}): {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        let interfaces = parse_device_status(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!("nmcli reported {} interface(s)", interfaces.len());
        Ok(interfaces)
    }
}

/// Parse the columns of `nmcli device status`
///
/// Columns are separated by two or more spaces (single spaces occur inside
/// values such as "connected (externally)"). The header row and loopback
/// devices are dropped; a connection of `--` means none.
pub fn parse_device_status(output: &str) -> Vec<InterfaceInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("DEVICE "))
        .filter_map(parse_row)
        .filter(|info| info.kind != "loopback")
        .collect()
}

fn parse_row(line: &str) -> Option<InterfaceInfo> {
    let mut columns = line
        .split("  ")
        .map(str::trim)
        .filter(|column| !column.is_empty());

    let name = columns.next()?.to_string();
    let kind = columns.next()?.to_string();
    let state = columns.next()?.to_string();
    let connection = columns
        .next()
        .filter(|connection| *connection != "--")
        .map(str::to_string);

    Some(InterfaceInfo {
        name,
        kind,
        state,
        connection,
    })
}
