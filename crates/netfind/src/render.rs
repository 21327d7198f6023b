//! Snapshot rendering for the terminal and for pipes

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use netfind_core::{DeviceEntry, DeviceStatus, RoundReport};
use serde::Serialize;
use std::io::Write;

const HEADERS: [&str; 8] = [
    "Mac Address",
    "Discovered at",
    "Status",
    "Interface",
    "Ip Address",
    "Hostname",
    "Manufacturer",
    "Last seen",
];

const STATUS_COLUMN: usize = 2;

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn row(entry: &DeviceEntry) -> [String; 8] {
    [
        entry.mac.map(|mac| mac.to_string()).unwrap_or_default(),
        local_time(entry.first_discovered_at),
        entry.status.to_string(),
        entry.interface.to_string(),
        entry.ip.to_string(),
        entry.hostname.clone().unwrap_or_default(),
        entry.manufacturer.clone().unwrap_or_default(),
        local_time(entry.last_seen_at),
    ]
}

/// Clear the screen and home the cursor
pub fn clear_screen(out: &mut impl Write) -> std::io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Redraw the whole screen with one round's table
pub fn draw_table(
    out: &mut impl Write,
    snapshot: &[DeviceEntry],
    report: &RoundReport,
    privileged: bool,
) -> std::io::Result<()> {
    clear_screen(out)?;
    out.write_all(render_table(snapshot, report, privileged).as_bytes())?;
    out.flush()
}

/// Startup line naming the interfaces being watched
pub fn selected_interfaces(interfaces: &[String]) -> String {
    format!("Selected interface(s): {}.", interfaces.join(", "))
}

/// Status cell, already padded to its column; down devices stand out
fn paint_status(status: DeviceStatus, cell: &str) -> String {
    match status {
        DeviceStatus::Up => cell.to_string(),
        DeviceStatus::Down => cell.red().to_string(),
        DeviceStatus::TentativeDown => cell.bright_black().to_string(),
    }
}

/// Table for one round
///
/// `privileged` only affects a hint under the table: without root the
/// sweep cannot see MAC addresses.
pub fn render_table(snapshot: &[DeviceEntry], report: &RoundReport, privileged: bool) -> String {
    let rows: Vec<[String; 8]> = snapshot.iter().map(row).collect();

    // measured before any colour is applied
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = format!("netfind  {}\n\n", local_time(report.started_at));

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, pad(&header, &widths));
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    push_line(&mut out, pad(&rule, &widths));
    for (entry, row) in snapshot.iter().zip(&rows) {
        let mut cells = pad(row, &widths);
        cells[STATUS_COLUMN] = paint_status(entry.status, &cells[STATUS_COLUMN]);
        push_line(&mut out, cells);
    }

    if rows.is_empty() {
        out.push_str("(no devices found yet)\n");
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        out.push('\n');
        for failure in failures {
            if let Some(error) = failure.outcome.error() {
                out.push_str(&format!("! {}: {}\n", failure.interface, error));
            }
        }
    }

    if !privileged {
        out.push_str("\nNot running as root: MAC addresses and manufacturers are unavailable\n");
    }

    out.push_str("\nPress CTRL+C to terminate execution\n");
    out
}

fn pad(cells: &[String], widths: &[usize]) -> Vec<String> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let fill = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(fill))
        })
        .collect()
}

fn push_line(out: &mut String, cells: Vec<String>) {
    out.push_str(cells.join("  ").trim_end());
    out.push('\n');
}

#[derive(Serialize)]
struct RoundLine<'a> {
    started_at: DateTime<Utc>,
    devices: &'a [DeviceEntry],
    failures: Vec<FailureLine<'a>>,
}

#[derive(Serialize)]
struct FailureLine<'a> {
    interface: &'a str,
    error: String,
}

/// One JSON document (single line) for one round
pub fn render_json(snapshot: &[DeviceEntry], report: &RoundReport) -> serde_json::Result<String> {
    let line = RoundLine {
        started_at: report.started_at,
        devices: snapshot,
        failures: report
            .failures()
            .filter_map(|failure| {
                failure.outcome.error().map(|error| FailureLine {
                    interface: failure.interface.as_str(),
                    error: error.to_string(),
                })
            })
            .collect(),
    };
    serde_json::to_string(&line)
}
