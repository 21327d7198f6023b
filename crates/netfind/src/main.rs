// # netfind - LAN device watcher
//
// This binary is a THIN integration layer: discovery, parsing and
// reconciliation live in netfind-core. netfind is responsible for:
// 1. Reading configuration from arguments (with `NETFIND_*` fallbacks)
// 2. Checking the external tools and the interface list
// 3. Wiring nmap, iproute2 and NetworkManager into the core
// 4. Rendering each round's snapshot until interrupted
//
// ## Configuration
//
// See `netfind --help`. Every option can also be set through the
// `NETFIND_*` variable named in the help text; arguments win.
//
// ## Example
//
// ```bash
// sudo netfind -d 5000 eth0 wlan0
// ```

mod render;
mod settings;

use anyhow::{Context, Result};
use netfind_core::traits::{InterfaceEnumerator, PrivilegeCheck};
use netfind_core::{DiscoveryRound, PollEvent, PollLoop, StopReason, preflight};
use netfind_iface_linux::{IpAddressLookup, NmcliEnumerator, RootPrivilegeCheck};
use netfind_sweep_nmap::NmapSweep;
use settings::{CommandLine, OutputMode, Settings};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Interrupted or round limit reached
/// - 1: Configuration or startup error (bad settings, missing tools, unknown interface)
/// - 2: Runtime error (a round failed under the abort policy)
#[derive(Debug, Clone, Copy)]
enum NetfindExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<NetfindExitCode> for ExitCode {
    fn from(code: NetfindExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let command_line = match CommandLine::parse_args() {
        Ok(command_line) => command_line,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                NetfindExitCode::ConfigError.into()
            } else {
                NetfindExitCode::CleanShutdown.into()
            };
        }
    };

    let settings = match command_line.into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return NetfindExitCode::ConfigError.into();
        }
    };

    // stdout belongs to the table
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NetfindExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NetfindExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(settings)).into()
}

async fn run(settings: Settings) -> NetfindExitCode {
    let (mut poll_loop, events, privileged) = match start(settings.config).await {
        Ok(started) => started,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return NetfindExitCode::ConfigError;
        }
    };

    let event_log = tokio::spawn(log_events(events));
    let shutdown_rx = spawn_shutdown_listener();

    let output = settings.output;
    let result = poll_loop
        .run_with_shutdown(Some(shutdown_rx), |snapshot, report| match output {
            OutputMode::Table => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = render::draw_table(&mut stdout, snapshot, report, privileged) {
                    warn!("Failed to draw table: {}", e);
                }
            }
            OutputMode::Json => match render::render_json(snapshot, report) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize snapshot: {}", e),
            },
        })
        .await;

    drop(poll_loop);
    let _ = event_log.await;

    match result {
        Ok(StopReason::Cancelled) => {
            info!("Interrupted, exiting");
            NetfindExitCode::CleanShutdown
        }
        Ok(StopReason::RoundLimit) => NetfindExitCode::CleanShutdown,
        Err(e) => {
            error!("Polling stopped: {}", e);
            NetfindExitCode::RuntimeError
        }
    }
}

/// Validate the machine against the configuration and build the loop
async fn start(
    mut config: netfind_core::NetfindConfig,
) -> Result<(PollLoop, mpsc::Receiver<PollEvent>, bool)> {
    preflight::require_tools(&config.tools.required())?;

    let privileged = RootPrivilegeCheck.is_privileged().await.unwrap_or(false);
    if !privileged {
        warn!("Not running as root: MAC addresses and manufacturers will not be available");
    }

    let available = NmcliEnumerator::from_config(&config.tools)
        .interfaces()
        .await
        .context("Failed to list network interfaces")?;
    config.interfaces = settings::resolve_interfaces(&config.interfaces, &available)?;
    // shown at any log level
    eprintln!("{}", render::selected_interfaces(&config.interfaces));

    let round = DiscoveryRound::new(
        Arc::new(IpAddressLookup::from_config(&config.tools)),
        Arc::new(NmapSweep::from_config(&config.tools)),
        &config,
    );
    let (poll_loop, events) = PollLoop::new(round, &config)?;

    Ok((poll_loop, events, privileged))
}

/// Forward poll events to the log until the loop drops its sender
async fn log_events(events: mpsc::Receiver<PollEvent>) {
    let mut events = ReceiverStream::new(events);
    while let Some(event) = events.next().await {
        match event {
            PollEvent::DeviceDiscovered { key, interface, .. } => {
                info!("Discovered {} on {}", key, interface)
            }
            PollEvent::InterfaceFailed {
                round,
                interface,
                error,
            } => warn!("Round {}: {} failed: {}", round, interface, error),
            PollEvent::InterfaceSkipped { round, interface } => {
                debug!("Round {}: {} has no address", round, interface)
            }
            PollEvent::RoundCompleted { round, devices, up } => {
                debug!("Round {} complete: {} device(s), {} up", round, devices, up)
            }
            PollEvent::Stopped { reason } => info!("Stopped: {}", reason),
            other => debug!("{:?}", other),
        }
    }
}

/// Fire a oneshot on SIGINT or SIGTERM
fn spawn_shutdown_listener() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received {}", signal),
            Err(e) => error!("Signal handling failed, stopping: {}", e),
        }
        let _ = tx.send(());
    });
    rx
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
