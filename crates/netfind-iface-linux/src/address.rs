//! Interface address lookup via iproute2

use netfind_core::config::ToolsConfig;
use netfind_core::net::{Interface, SweepAddress};
use netfind_core::traits::AddressLookup;
use netfind_core::{Error, Result};
use std::path::PathBuf;

/// AddressLookup backed by `ip -4 address show dev <iface>`
#[derive(Debug, Clone)]
pub struct IpAddressLookup {
    binary: PathBuf,
}

impl IpAddressLookup {
    pub fn new() -> Self {
        Self::with_binary("ip")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::with_binary(tools.ip.clone())
    }
}

impl Default for IpAddressLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AddressLookup for IpAddressLookup {
    async fn address(&self, interface: &Interface) -> Result<Option<SweepAddress>> {
        let output = super::run_tool(
            &self.binary,
            &["-4", "address", "show", "dev", interface.as_str()],
        )
        .await
        .map_err(|e| match e {
            Error::Io(io) => Error::lookup_failed(interface.as_str(), io.to_string()),
            other => other,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::lookup_failed(
                interface.as_str(),
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_inet_address(&stdout)
            .map_err(|reason| Error::lookup_failed(interface.as_str(), reason))
    }
}

/// First `inet` address in `ip address show` output
///
/// Returns `Ok(None)` when the interface has no IPv4 address. Point-to-point
/// links print `inet <local> peer <remote>/<p>` with no prefix on the local
/// address; the peer's prefix is used there, or /32 if it has none.
pub fn parse_inet_address(output: &str) -> std::result::Result<Option<SweepAddress>, String> {
    let Some(rest) = output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("inet "))
    else {
        return Ok(None);
    };

    let mut tokens = rest.split_whitespace();
    let Some(local) = tokens.next() else {
        return Err("empty inet line".to_string());
    };

    let cidr = if local.contains('/') {
        local.to_string()
    } else {
        let prefix = match (tokens.next(), tokens.next()) {
            (Some("peer"), Some(peer)) => peer.split_once('/').map_or("32", |(_, p)| p),
            _ => "32",
        };
        format!("{}/{}", local, prefix)
    };

    cidr.parse::<SweepAddress>()
        .map(Some)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH0: &str = "\
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP group default qlen 1000
    inet 192.168.1.10/24 brd 192.168.1.255 scope global dynamic noprefixroute eth0
       valid_lft 85520sec preferred_lft 85520sec
    inet 192.168.1.99/24 scope global secondary eth0
       valid_lft forever preferred_lft forever
";

    #[test]
    fn takes_primary_address() {
        let address = parse_inet_address(ETH0).unwrap().unwrap();
        assert_eq!(address.to_string(), "192.168.1.10/24");
    }

    #[test]
    fn no_inet_line_means_unassigned() {
        let down = "3: usb0: <NO-CARRIER,BROADCAST,MULTICAST,UP> mtu 1500 state DOWN\n";
        assert_eq!(parse_inet_address(down), Ok(None));
        assert_eq!(parse_inet_address(""), Ok(None));
    }

    #[test]
    fn ignores_inet6_lines() {
        let v6_only = "\
4: wg0: <POINTOPOINT,NOARP,UP,LOWER_UP> mtu 1420
    inet6 fe80::1/64 scope link
";
        assert_eq!(parse_inet_address(v6_only), Ok(None));
    }

    #[test]
    fn malformed_address_is_an_error() {
        let garbled = "    inet 192.168.1.300/24 brd 192.168.1.255\n";
        assert!(parse_inet_address(garbled).is_err());
    }

    #[test]
    fn point_to_point_uses_peer_prefix() {
        let tun0 = "\
5: tun0: <POINTOPOINT,MULTICAST,NOARP,UP,LOWER_UP> mtu 1500 state UNKNOWN
    inet 10.8.0.2 peer 10.8.0.1/32 scope global tun0
       valid_lft forever preferred_lft forever
";
        let address = parse_inet_address(tun0).unwrap().unwrap();
        assert_eq!(address.to_string(), "10.8.0.2/32");

        let wider = "    inet 10.9.0.6 peer 10.9.0.5/30 scope global tun1\n";
        assert_eq!(
            parse_inet_address(wider).unwrap().unwrap().to_string(),
            "10.9.0.6/30"
        );
    }

    #[test]
    fn bare_local_address_defaults_to_host_prefix() {
        let bare = "    inet 172.16.5.4 scope global ppp0\n";
        assert_eq!(
            parse_inet_address(bare).unwrap().unwrap().to_string(),
            "172.16.5.4/32"
        );
    }

    #[tokio::test]
    async fn vanished_binary_is_a_lookup_failure() {
        let lookup = IpAddressLookup::with_binary("/nonexistent/netfind/ip");
        let err = lookup.address(&Interface::from("eth3")).await.unwrap_err();
        assert!(err.is_per_interface());
        match err {
            Error::AddressLookupFailed { interface, .. } => assert_eq!(interface, "eth3"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_a_lookup_failure() {
        // `false` ignores its arguments and exits 1
        let lookup = IpAddressLookup::with_binary("false");
        match lookup.address(&Interface::from("eth9")).await {
            Err(Error::AddressLookupFailed { interface, .. }) => assert_eq!(interface, "eth9"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
