//! Device registry
//!
//! The registry is the inventory of every device seen since startup. It is
//! append/update-only: entries are created on first observation, updated in
//! place by later rounds, and never removed.
//!
//! ## Identity
//!
//! A device is filed under its MAC address when the first sighting carries
//! one, otherwise under its IP address. That key never changes. When a
//! device keyed by IP later shows up with a MAC (for example once the
//! process gains the privileges needed to read link-layer data), the MAC is
//! recorded on the existing entry and indexed, so later sightings of that
//! MAC reach the same entry even after a DHCP address change.
//!
//! The entry's `Ip` key stays in the index after such a move. A later
//! sighting of the old address that carries no MAC is therefore still
//! routed to the moved entry (and pulls its `ip` back), even if some other
//! host now holds that address. A sighting of the old address that does
//! carry a different MAC becomes a new device.
//!
//! ## Usage
//!
//! ```rust
//! use netfind_core::{DeviceRegistry, DiscoveryRecord, Interface};
//!
//! let mut registry = DeviceRegistry::new();
//! let eth0 = Interface::new("eth0");
//!
//! registry.begin_round();
//! registry.apply(DiscoveryRecord::up("10.0.0.5".parse().unwrap()), &eth0, chrono::Utc::now());
//!
//! assert_eq!(registry.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::device::{DeviceEntry, DeviceKey, DeviceStatus, DiscoveryRecord};
use crate::net::Interface;

/// What [`DeviceRegistry::apply`] did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new entry was created under this key
    Inserted(DeviceKey),
    /// The entry with this key was updated in place
    Updated(DeviceKey),
}

/// Number of entries per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub up: usize,
    pub down: usize,
    pub tentative_down: usize,
}

/// In-memory device table keyed by MAC (fallback IP)
///
/// Entries are kept in first-discovered order so a rendered table keeps a
/// stable layout across rounds.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    entries: Vec<DeviceEntry>,
    /// Primary keys plus MACs learned by IP-keyed entries
    index: HashMap<DeviceKey, usize>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every known device as tentatively down
    ///
    /// Called once at the start of each round, before any [`apply`](Self::apply).
    pub fn begin_round(&mut self) {
        for entry in &mut self.entries {
            entry.status = DeviceStatus::TentativeDown;
        }
    }

    /// Merge one discovery record observed on `interface` at `now`
    pub fn apply(
        &mut self,
        record: DiscoveryRecord,
        interface: &Interface,
        now: DateTime<Utc>,
    ) -> ApplyOutcome {
        let Some(slot) = self.locate(&record) else {
            let key = record.key();
            self.index.insert(key, self.entries.len());
            self.entries
                .push(DeviceEntry::from_record(key, record, interface, now));
            return ApplyOutcome::Inserted(key);
        };

        let entry = &mut self.entries[slot];

        if entry.mac.is_none()
            && let Some(mac) = record.mac
        {
            entry.mac = Some(mac);
            self.index.insert(DeviceKey::Mac(mac), slot);
        }
        if entry.manufacturer.is_none() && record.mac.is_some() {
            entry.manufacturer = record.manufacturer;
        }

        entry.ip = record.ip;
        entry.hostname = record.hostname;
        entry.status = record.status.into();
        entry.interface = interface.clone();
        entry.last_seen_at = now;
        entry.latency = record.latency;

        ApplyOutcome::Updated(entry.key)
    }

    /// Find the entry a record belongs to, if any
    fn locate(&self, record: &DiscoveryRecord) -> Option<usize> {
        let by_ip = self.index.get(&DeviceKey::Ip(record.ip)).copied();

        match record.mac {
            None => by_ip,
            Some(mac) => self
                .index
                .get(&DeviceKey::Mac(mac))
                .copied()
                // an address reused by a different NIC is a different device
                .or_else(|| by_ip.filter(|&slot| self.entries[slot].mac.is_none())),
        }
    }

    /// All entries in first-discovered order
    pub fn snapshot(&self) -> Vec<DeviceEntry> {
        self.entries.clone()
    }

    /// Borrowing view of the entries in first-discovered order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }

    /// Look up an entry by its key or by a MAC it has learned
    pub fn get(&self, key: &DeviceKey) -> Option<&DeviceEntry> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by_status(&self) -> StatusCounts {
        self.entries
            .iter()
            .fold(StatusCounts::default(), |mut counts, entry| {
                match entry.status {
                    DeviceStatus::Up => counts.up += 1,
                    DeviceStatus::Down => counts.down += 1,
                    DeviceStatus::TentativeDown => counts.tentative_down += 1,
                }
                counts
            })
    }
}
