//! Discovery polling loop
//!
//! The PollLoop is responsible for:
//! - Running a [`DiscoveryRound`] over the configured interfaces
//! - Handing a registry snapshot to the caller after every round
//! - Sleeping the configured interval between rounds
//! - Stopping promptly on cancellation, even mid-round or mid-sleep
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   round    ┌────────────────┐  snapshot  ┌─────────────┐
//! │  PollLoop   │──────────▶│ DiscoveryRound │──────────▶│ on_snapshot │
//! └─────────────┘            └────────────────┘            └─────────────┘
//!        │                           │
//!        │ sleep(interval)           ▼
//!        │                   ┌────────────────┐
//!        └─────── loop ──────│ DeviceRegistry │
//!                            └────────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. `Started`
//! 2. Per round: `RoundStarted`, then `InterfaceSkipped` / `InterfaceFailed` /
//!    `DeviceDiscovered` as they apply, then `RoundCompleted`
//! 3. `Stopped` once the loop ends for any reason

pub mod round;

pub use round::{DiscoveryRound, InterfaceOutcome, InterfaceReport, RoundReport};

use crate::config::NetfindConfig;
use crate::device::{DeviceEntry, DeviceKey};
use crate::error::Result;
use crate::net::Interface;
use crate::registry::DeviceRegistry;
use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the PollLoop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Loop started
    Started {
        interfaces: Vec<Interface>,
    },

    /// A round is about to scan the interfaces
    RoundStarted {
        round: u64,
    },

    /// Interface had no address and was not swept
    InterfaceSkipped {
        round: u64,
        interface: Interface,
    },

    /// Lookup, sweep or parse failed for an interface
    InterfaceFailed {
        round: u64,
        interface: Interface,
        error: String,
    },

    /// A device was seen for the first time
    DeviceDiscovered {
        round: u64,
        key: DeviceKey,
        interface: Interface,
    },

    /// A round finished and its snapshot was delivered
    RoundCompleted {
        round: u64,
        devices: usize,
        up: usize,
    },

    /// Loop stopped
    Stopped {
        reason: String,
    },
}

/// Why the loop stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown signal received (or its sender dropped)
    Cancelled,
    /// `max_rounds` rounds completed
    RoundLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "Shutdown signal"),
            StopReason::RoundLimit => write!(f, "Round limit reached"),
        }
    }
}

/// Discovery polling loop
///
/// Owns the [`DeviceRegistry`]; it is only ever mutated from the task
/// driving [`PollLoop::run`].
///
/// ## Lifecycle
///
/// 1. Create with [`PollLoop::new()`]
/// 2. Start with [`PollLoop::run()`]
/// 3. Loop runs until Ctrl-C, the round limit, or a fatal round error
/// 4. Inspect [`PollLoop::registry()`] afterwards if needed
pub struct PollLoop {
    round: DiscoveryRound,

    registry: DeviceRegistry,

    /// Interfaces swept each round, in configuration order
    interfaces: Vec<Interface>,

    /// Pause between rounds
    interval: Duration,

    max_rounds: Option<u64>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<PollEvent>,
}

impl PollLoop {
    /// Create a new polling loop
    ///
    /// # Parameters
    ///
    /// - `round`: Round driver (holds the lookup and sweep implementations)
    /// - `config`: netfind configuration; interfaces and intervals come from here
    ///
    /// # Returns
    ///
    /// A tuple of (loop, event_receiver) where event_receiver yields poll events
    pub fn new(
        round: DiscoveryRound,
        config: &NetfindConfig,
    ) -> Result<(Self, mpsc::Receiver<PollEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.poll.event_channel_capacity);

        let poll_loop = Self {
            round,
            registry: DeviceRegistry::new(),
            interfaces: config.interfaces.iter().map(Interface::new).collect(),
            interval: config.poll.interval(),
            max_rounds: config.poll.max_rounds,
            event_tx: tx,
        };

        Ok((poll_loop, rx))
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Run the loop until Ctrl-C or the configured round limit
    ///
    /// `on_snapshot` is called after every completed round with the
    /// registry contents in insertion order and the round's report.
    ///
    /// # Returns
    ///
    /// - `Ok(StopReason)`: Clean stop
    /// - `Err(Error)`: A round failed under `abort_on_interface_error`
    pub async fn run<F>(&mut self, on_snapshot: F) -> Result<StopReason>
    where
        F: FnMut(&[DeviceEntry], &RoundReport),
    {
        self.run_internal(None, on_snapshot).await
    }

    /// Run the loop with a programmatic shutdown signal instead of Ctrl-C
    ///
    /// Sending on (or dropping) the paired sender stops the loop at the next
    /// await point: an in-flight round is abandoned without delivering a
    /// snapshot, and a pending sleep is cut short.
    pub async fn run_with_shutdown<F>(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
        on_snapshot: F,
    ) -> Result<StopReason>
    where
        F: FnMut(&[DeviceEntry], &RoundReport),
    {
        self.run_internal(shutdown_rx, on_snapshot).await
    }

    async fn run_internal<F>(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
        mut on_snapshot: F,
    ) -> Result<StopReason>
    where
        F: FnMut(&[DeviceEntry], &RoundReport),
    {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        self.emit_event(PollEvent::Started {
            interfaces: self.interfaces.clone(),
        });
        info!("Polling {} interface(s) every {:?}", self.interfaces.len(), self.interval);

        let mut completed: u64 = 0;
        loop {
            let round_no = completed + 1;
            self.emit_event(PollEvent::RoundStarted { round: round_no });
            debug!("Starting round {}", round_no);

            let finished = tokio::select! {
                result = self.round.run(&self.interfaces, &mut self.registry, Utc::now()) => Some(result),
                _ = &mut shutdown => None,
            };

            let report = match finished {
                None => return Ok(self.stop(StopReason::Cancelled)),
                Some(Ok(report)) => report,
                Some(Err(e)) => {
                    error!("Round {} failed: {}", round_no, e);
                    self.emit_event(PollEvent::Stopped {
                        reason: format!("Round {} failed: {}", round_no, e),
                    });
                    return Err(e);
                }
            };

            self.report_round(round_no, &report);
            on_snapshot(&self.registry.snapshot(), &report);
            completed += 1;

            if self.max_rounds.is_some_and(|max| completed >= max) {
                return Ok(self.stop(StopReason::RoundLimit));
            }

            let slept = tokio::select! {
                _ = tokio::time::sleep(self.interval) => true,
                _ = &mut shutdown => false,
            };
            if !slept {
                return Ok(self.stop(StopReason::Cancelled));
            }
        }
    }

    /// Emit the per-interface and per-device events of a finished round
    fn report_round(&self, round: u64, report: &RoundReport) {
        for entry in &report.interfaces {
            match &entry.outcome {
                InterfaceOutcome::Swept { .. } => {}
                InterfaceOutcome::Skipped(_) => self.emit_event(PollEvent::InterfaceSkipped {
                    round,
                    interface: entry.interface.clone(),
                }),
                InterfaceOutcome::Failed(e) | InterfaceOutcome::PartiallyParsed { error: e, .. } => {
                    self.emit_event(PollEvent::InterfaceFailed {
                        round,
                        interface: entry.interface.clone(),
                        error: e.to_string(),
                    })
                }
            }
        }

        for (key, interface) in &report.discovered {
            self.emit_event(PollEvent::DeviceDiscovered {
                round,
                key: *key,
                interface: interface.clone(),
            });
        }

        let counts = self.registry.count_by_status();
        self.emit_event(PollEvent::RoundCompleted {
            round,
            devices: self.registry.len(),
            up: counts.up,
        });
    }

    fn stop(&self, reason: StopReason) -> StopReason {
        info!("Poll loop stopped: {}", reason);
        self.emit_event(PollEvent::Stopped {
            reason: reason.to_string(),
        });
        reason
    }

    /// Emit a poll event
    ///
    /// Never blocks the loop; events are dropped when nobody keeps up.
    fn emit_event(&self, event: PollEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}
