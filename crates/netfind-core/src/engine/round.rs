//! One discovery round
//!
//! A round marks every known device tentatively down, scans each
//! configured interface (address lookup, then sweep), parses the
//! transcripts, and merges the records into the registry.
//!
//! ```text
//!                 ┌───────────────┐
//!                 │ DiscoveryRound│
//!                 └───────────────┘
//!                         │ begin_round()
//!        ┌────────────────┼────────────────┐      scans run concurrently
//!        ▼                ▼                ▼      (bounded by max_concurrent)
//!   lookup+sweep     lookup+sweep     lookup+sweep
//!      eth0             wlan0            usb0
//!        └────────────────┼────────────────┘
//!                         ▼                       results applied in
//!                 parse → registry.apply()        interface order, by the
//!                                                 round task alone
//! ```
//!
//! Interfaces are isolated from each other: an interface without an
//! address, a sweep that fails or times out, or a transcript that does not
//! parse is recorded in the [`RoundReport`] and the round moves on.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::NetfindConfig;
use crate::device::{DeviceKey, DiscoveryRecord};
use crate::error::{Error, Result};
use crate::net::{Interface, SweepAddress};
use crate::parser::parse_sweep;
use crate::registry::{ApplyOutcome, DeviceRegistry};
use crate::traits::{AddressLookup, HostSweep};

/// What happened on one interface during a round
#[derive(Debug)]
pub enum InterfaceOutcome {
    /// Swept and fully parsed
    Swept {
        address: SweepAddress,
        /// Records applied to the registry
        records: usize,
    },

    /// Swept, but the transcript was malformed
    PartiallyParsed {
        address: SweepAddress,
        /// Records parsed before the failure and applied (0 when partial
        /// results are discarded)
        applied: usize,
        error: Error,
    },

    /// Not swept this round ([`Error::InterfaceNotAssigned`])
    Skipped(Error),

    /// Address lookup or sweep failed, or the time budget ran out
    Failed(Error),
}

impl InterfaceOutcome {
    /// Records this interface contributed to the registry
    pub fn records_applied(&self) -> usize {
        match self {
            InterfaceOutcome::Swept { records, .. } => *records,
            InterfaceOutcome::PartiallyParsed { applied, .. } => *applied,
            _ => 0,
        }
    }

    /// The error, for every outcome other than a clean sweep
    pub fn error(&self) -> Option<&Error> {
        match self {
            InterfaceOutcome::Swept { .. } => None,
            InterfaceOutcome::PartiallyParsed { error, .. }
            | InterfaceOutcome::Skipped(error)
            | InterfaceOutcome::Failed(error) => Some(error),
        }
    }

    /// Whether the interface was meant to be swept but could not be
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            InterfaceOutcome::Failed(_) | InterfaceOutcome::PartiallyParsed { .. }
        )
    }
}

/// Outcome of one interface in a round
#[derive(Debug)]
pub struct InterfaceReport {
    pub interface: Interface,
    pub outcome: InterfaceOutcome,
}

/// Everything a round did, reported alongside the registry snapshot
#[derive(Debug)]
pub struct RoundReport {
    /// Timestamp applied to every record of the round
    pub started_at: DateTime<Utc>,
    /// One report per configured interface, in configuration order
    pub interfaces: Vec<InterfaceReport>,
    /// Keys of devices first seen in this round, with the reporting interface
    pub discovered: Vec<(DeviceKey, Interface)>,
}

impl RoundReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            interfaces: Vec::new(),
            discovered: Vec::new(),
        }
    }

    pub fn records_applied(&self) -> usize {
        self.interfaces
            .iter()
            .map(|report| report.outcome.records_applied())
            .sum()
    }

    /// Interfaces that failed this round (skipped ones excluded)
    pub fn failures(&self) -> impl Iterator<Item = &InterfaceReport> {
        self.interfaces
            .iter()
            .filter(|report| report.outcome.is_failure())
    }
}

/// Result of scanning one interface, before anything touches the registry
enum Scan {
    Unassigned,
    Swept {
        address: SweepAddress,
        transcript: String,
    },
    Failed(Error),
}

/// Runs one polling cycle over a set of interfaces
pub struct DiscoveryRound {
    lookup: Arc<dyn AddressLookup>,
    sweep: Arc<dyn HostSweep>,
    timeout: Duration,
    max_concurrent: usize,
    apply_partial: bool,
    abort_on_interface_error: bool,
}

impl DiscoveryRound {
    /// Create a round driver
    ///
    /// # Parameters
    ///
    /// - `lookup`: Address lookup implementation
    /// - `sweep`: Host sweep implementation
    /// - `config`: Timeout, concurrency and failure policy are taken from here
    pub fn new(
        lookup: Arc<dyn AddressLookup>,
        sweep: Arc<dyn HostSweep>,
        config: &NetfindConfig,
    ) -> Self {
        Self {
            lookup,
            sweep,
            timeout: config.sweep.timeout(),
            max_concurrent: config.sweep.max_concurrent.max(1),
            apply_partial: config.sweep.apply_partial_results,
            abort_on_interface_error: config.poll.abort_on_interface_error,
        }
    }

    /// Run one round
    ///
    /// Calls `registry.begin_round()` exactly once, before any record is
    /// applied. Every record of the round is stamped with `now`.
    ///
    /// # Returns
    ///
    /// - `Ok(RoundReport)`: The round completed; per-interface problems are in the report
    /// - `Err(Error)`: An interface failed and `abort_on_interface_error` is set, or
    ///   a lookup or sweep returned an error that is not tied to one interface
    pub async fn run(
        &self,
        interfaces: &[Interface],
        registry: &mut DeviceRegistry,
        now: DateTime<Utc>,
    ) -> Result<RoundReport> {
        registry.begin_round();

        let scans = self.scan_all(interfaces).await;
        let mut report = RoundReport::new(now);

        for (interface, scan) in interfaces.iter().zip(scans) {
            let outcome = self.settle(interface, scan, registry, now, &mut report.discovered);

            match outcome {
                InterfaceOutcome::Failed(err) | InterfaceOutcome::PartiallyParsed { error: err, .. }
                    if self.abort_on_interface_error || !err.is_per_interface() =>
                {
                    error!("Aborting round: {} failed: {}", interface, err);
                    return Err(err);
                }
                outcome => report.interfaces.push(InterfaceReport {
                    interface: interface.clone(),
                    outcome,
                }),
            }
        }

        debug!(
            "Round complete: {} record(s) from {} interface(s), {} new",
            report.records_applied(),
            interfaces.len(),
            report.discovered.len()
        );

        Ok(report)
    }

    /// Scan every interface, at most `max_concurrent` at a time
    ///
    /// Results come back in the order of `interfaces`, whatever order the
    /// scans finish in.
    async fn scan_all(&self, interfaces: &[Interface]) -> Vec<Scan> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (slot, interface) in interfaces.iter().enumerate() {
            let lookup = Arc::clone(&self.lookup);
            let sweep = Arc::clone(&self.sweep);
            let permits = Arc::clone(&permits);
            let interface = interface.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let scan = tokio::time::timeout(
                    timeout,
                    scan_interface(lookup.as_ref(), sweep.as_ref(), &interface),
                )
                .await
                .unwrap_or_else(|_| {
                    Scan::Failed(Error::sweep_timed_out(interface.as_str(), timeout))
                });
                (slot, scan)
            });
        }

        let mut scans: Vec<Option<Scan>> = interfaces.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, scan)) => scans[slot] = Some(scan),
                Err(e) => error!("Scan task ended abnormally: {}", e),
            }
        }

        scans
            .into_iter()
            .zip(interfaces)
            .map(|(scan, interface)| {
                scan.unwrap_or_else(|| {
                    Scan::Failed(Error::sweep_failed(interface.as_str(), "scan task panicked"))
                })
            })
            .collect()
    }

    /// Turn a scan into registry updates and an outcome
    fn settle(
        &self,
        interface: &Interface,
        scan: Scan,
        registry: &mut DeviceRegistry,
        now: DateTime<Utc>,
        discovered: &mut Vec<(DeviceKey, Interface)>,
    ) -> InterfaceOutcome {
        match scan {
            Scan::Unassigned => {
                debug!("{} has no address, skipping", interface);
                InterfaceOutcome::Skipped(Error::not_assigned(interface.as_str()))
            }
            Scan::Failed(err) => {
                warn!("{}: {}", interface, err);
                InterfaceOutcome::Failed(err)
            }
            Scan::Swept {
                address,
                transcript,
            } => match parse_sweep(&transcript) {
                Ok(records) => InterfaceOutcome::Swept {
                    address,
                    records: apply_all(records, interface, registry, now, discovered),
                },
                Err(err) => {
                    warn!("{}: unparseable sweep of {}: {}", interface, address, err);
                    let applied = if self.apply_partial {
                        apply_all(err.parsed().to_vec(), interface, registry, now, discovered)
                    } else {
                        0
                    };
                    InterfaceOutcome::PartiallyParsed {
                        address,
                        applied,
                        error: Error::Parse(err),
                    }
                }
            },
        }
    }
}

async fn scan_interface(
    lookup: &dyn AddressLookup,
    sweep: &dyn HostSweep,
    interface: &Interface,
) -> Scan {
    let address = match lookup.address(interface).await {
        Ok(Some(address)) => address,
        Ok(None) => return Scan::Unassigned,
        Err(e) => return Scan::Failed(e),
    };

    debug!("Sweeping {} on {} with {}", address, interface, sweep.tool_name());

    match sweep.sweep(&address).await {
        Ok(transcript) => Scan::Swept {
            address,
            transcript,
        },
        Err(e) => Scan::Failed(e),
    }
}

fn apply_all(
    records: Vec<DiscoveryRecord>,
    interface: &Interface,
    registry: &mut DeviceRegistry,
    now: DateTime<Utc>,
    discovered: &mut Vec<(DeviceKey, Interface)>,
) -> usize {
    let count = records.len();
    for record in records {
        if let ApplyOutcome::Inserted(key) = registry.apply(record, interface, now) {
            info!("New device {} on {}", key, interface);
            discovered.push((key, interface.clone()));
        }
    }
    count
}
