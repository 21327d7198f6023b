//! Discovery records and device entries
//!
//! A [`DiscoveryRecord`] is one host as reported by one sweep. A
//! [`DeviceEntry`] is what the registry keeps across rounds for one host.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::net::{Interface, MacAddr};

/// Reachability reported by a sweep for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    Up,
    Down,
}

/// Status of a registry entry after the latest round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Re-observed and reported up this round
    Up,
    /// Re-observed this round and explicitly reported down by the sweep
    Down,
    /// Not (yet) reported by this round's sweeps
    TentativeDown,
}

impl DeviceStatus {
    /// True for both confirmed and tentative down
    pub fn is_down(&self) -> bool {
        !matches!(self, DeviceStatus::Up)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Up => "up",
            DeviceStatus::Down => "down",
            DeviceStatus::TentativeDown => "down?",
        }
    }
}

impl From<HostState> for DeviceStatus {
    fn from(state: HostState) -> Self {
        match state {
            HostState::Up => DeviceStatus::Up,
            HostState::Down => DeviceStatus::Down,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One host observation parsed from a single sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    /// Resolved hostname, if the sweep printed one
    pub hostname: Option<String>,
    /// Address the host answered on
    pub ip: IpAddr,
    /// Reported reachability
    pub status: HostState,
    /// Link-layer address; absent across L3 hops or for the scanning host
    pub mac: Option<MacAddr>,
    /// Vendor derived from the MAC's OUI
    pub manufacturer: Option<String>,
    /// Round-trip time reported for the host
    pub latency: Option<Duration>,
}

impl DiscoveryRecord {
    /// A reachable host with no link-layer identity
    pub fn up(ip: IpAddr) -> Self {
        Self {
            hostname: None,
            ip,
            status: HostState::Up,
            mac: None,
            manufacturer: None,
            latency: None,
        }
    }

    pub fn with_mac(mut self, mac: MacAddr, manufacturer: Option<String>) -> Self {
        self.mac = Some(mac);
        self.manufacturer = manufacturer;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_status(mut self, status: HostState) -> Self {
        self.status = status;
        self
    }

    /// The identity this record would be filed under if first seen now
    pub fn key(&self) -> DeviceKey {
        match self.mac {
            Some(mac) => DeviceKey::Mac(mac),
            None => DeviceKey::Ip(self.ip),
        }
    }
}

/// Stable identity of a device: its MAC if known at first sight, else its IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKey {
    Mac(MacAddr),
    Ip(IpAddr),
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKey::Mac(mac) => fmt::Display::fmt(mac, f),
            DeviceKey::Ip(ip) => fmt::Display::fmt(ip, f),
        }
    }
}

impl Serialize for DeviceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A device tracked by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEntry {
    /// Identity chosen at first sight; never changes
    pub key: DeviceKey,
    pub mac: Option<MacAddr>,
    pub manufacturer: Option<String>,
    pub ip: IpAddr,
    pub hostname: Option<String>,
    /// Last interface whose sweep reported this device
    pub interface: Interface,
    pub status: DeviceStatus,
    pub first_discovered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", with = "latency_ms")]
    pub latency: Option<Duration>,
}

impl DeviceEntry {
    pub(crate) fn from_record(
        key: DeviceKey,
        record: DiscoveryRecord,
        interface: &Interface,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            mac: record.mac,
            manufacturer: record.manufacturer,
            ip: record.ip,
            hostname: record.hostname,
            interface: interface.clone(),
            status: record.status.into(),
            first_discovered_at: now,
            last_seen_at: now,
            latency: record.latency,
        }
    }
}

mod latency_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        latency: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match latency {
            Some(d) => serializer.serialize_f64(d.as_secs_f64() * 1000.0),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefers_mac() {
        let ip = IpAddr::from([10, 0, 0, 9]);
        let bare = DiscoveryRecord::up(ip);
        assert_eq!(bare.key(), DeviceKey::Ip(ip));

        let mac = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0, 1]);
        let linked = bare.with_mac(mac, None);
        assert_eq!(linked.key(), DeviceKey::Mac(mac));
        assert_eq!(linked.key().to_string(), "DE:AD:BE:EF:00:01");
    }

    #[test]
    fn tentative_down_counts_as_down() {
        assert!(DeviceStatus::TentativeDown.is_down());
        assert!(DeviceStatus::Down.is_down());
        assert!(!DeviceStatus::Up.is_down());
        assert_eq!(DeviceStatus::from(HostState::Down), DeviceStatus::Down);
    }

    #[test]
    fn entry_serializes_key_as_text() {
        let now = Utc::now();
        let record = DiscoveryRecord::up(IpAddr::from([10, 0, 0, 5]));
        let entry = DeviceEntry::from_record(record.key(), record, &Interface::new("eth0"), now);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "10.0.0.5");
        assert_eq!(json["status"], "up");
        assert_eq!(json["interface"], "eth0");
        assert!(json.get("latency").is_none());
    }
}
