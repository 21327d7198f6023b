//! Network identifiers: interfaces, sweep targets and link-layer addresses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// An OS network interface name (e.g. "eth0", "wlp3s0")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface(String);

impl Interface {
    /// Create an interface handle from its OS name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The OS name of the interface
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Interface {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Interface {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The CIDR address of an interface, used as the subnet to sweep
///
/// Looked up fresh every round since interfaces may be re-addressed
/// between rounds. Displays as `addr/prefix`, which is also the form the
/// sweep tool receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepAddress {
    addr: IpAddr,
    prefix: u8,
}

impl SweepAddress {
    /// Create a sweep address, rejecting prefixes longer than the address
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, Error> {
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(Error::invalid_input(format!(
                "prefix /{} is too long for {}",
                prefix, addr
            )));
        }
        Ok(Self { addr, prefix })
    }

    /// The interface's own address
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The network prefix length
    pub fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl fmt::Display for SweepAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for SweepAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::invalid_input(format!("'{}' is not in CIDR form", s)))?;

        let addr: IpAddr = addr
            .parse()
            .map_err(|_| Error::invalid_input(format!("invalid address in '{}'", s)))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| Error::invalid_input(format!("invalid prefix in '{}'", s)))?;

        Self::new(addr, prefix)
    }
}

/// A 48-bit link-layer (MAC) address
///
/// Displays as upper-case colon-separated hex, the form nmap prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// Create a MAC address from its octets
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::invalid_input(format!("'{}' is not a MAC address", s));

        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
