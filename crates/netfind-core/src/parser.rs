//! Sweep transcript parser
//!
//! Turns the text printed by one ping sweep (`nmap -sn <cidr>`) into
//! [`DiscoveryRecord`]s. This is the only place that knows the tool's
//! output format.
//!
//! ## Grammar (version 1)
//!
//! ```text
//! Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC   banner, skipped
//! Nmap scan report for router.lan (192.168.1.1)                      header
//! Host is up (0.0010s latency).                                      status
//! MAC Address: AA:BB:CC:DD:EE:FF (Netgear)                           optional
//! Nmap scan report for 192.168.1.20                                  header without name
//! Host is up.
//! Nmap done: 256 IP addresses (2 hosts up) scanned in 2.05 seconds   terminator
//! ```
//!
//! Blank lines and `Warning:`/`Note:` lines between host blocks are
//! ignored. Anything else out of place is a [`ParseError`]. A transcript
//! that ends before the terminator is an error too: the sweep was cut
//! short and its host list cannot be trusted to be complete.

use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

use crate::device::{DiscoveryRecord, HostState};
use crate::net::MacAddr;

const BANNER: &str = "Starting Nmap";
const HEADER: &str = "Nmap scan report for ";
const STATUS: &str = "Host is ";
const MAC_LINE: &str = "MAC Address: ";
const SUMMARY: &str = "Nmap done:";
const NOISE: &[&str] = &["Warning:", "Note:"];

/// A transcript that did not match the grammar
///
/// Carries the records that were completely parsed before the offending
/// line, so the caller can decide whether to keep them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number of the failure
    pub line: usize,
    pub kind: ParseErrorKind,
    parsed: Vec<DiscoveryRecord>,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind, parsed: Vec<DiscoveryRecord>) -> Self {
        Self { line, kind, parsed }
    }

    /// Records fully parsed before the failure, in transcript order
    pub fn parsed(&self) -> &[DiscoveryRecord] {
        &self.parsed
    }

    pub fn into_parsed(self) -> Vec<DiscoveryRecord> {
        self.parsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("transcript ended before the 'Nmap done' summary")]
    UnexpectedEof,

    #[error("expected a host header, found '{0}'")]
    UnexpectedLine(String),

    #[error("host header has no valid address: '{0}'")]
    InvalidAddress(String),

    #[error("expected a host status line, found '{0}'")]
    InvalidStatus(String),

    #[error("invalid MAC address line: '{0}'")]
    InvalidMac(String),
}

/// Parse one sweep transcript into records, in the order hosts appear
pub fn parse_sweep(raw: &str) -> Result<Vec<DiscoveryRecord>, ParseError> {
    let mut cursor = Cursor::new(raw);
    let mut records = Vec::new();

    loop {
        let Some((line_no, line)) = cursor.next_significant() else {
            return Err(ParseError::new(
                cursor.position(),
                ParseErrorKind::UnexpectedEof,
                records,
            ));
        };

        if line.starts_with(BANNER) {
            continue;
        }
        if line.starts_with(SUMMARY) {
            return Ok(records);
        }

        let Some(header) = line.strip_prefix(HEADER) else {
            return Err(ParseError::new(
                line_no,
                ParseErrorKind::UnexpectedLine(line.to_string()),
                records,
            ));
        };

        match parse_block(header, line_no, &mut cursor) {
            Ok(record) => records.push(record),
            Err((line, kind)) => return Err(ParseError::new(line, kind, records)),
        }
    }
}

/// Parse one host block whose header has already been consumed
fn parse_block(
    header: &str,
    header_line: usize,
    cursor: &mut Cursor<'_>,
) -> Result<DiscoveryRecord, (usize, ParseErrorKind)> {
    let (hostname, ip) = parse_header(header)
        .ok_or_else(|| (header_line, ParseErrorKind::InvalidAddress(header.to_string())))?;

    let (status_line, status) = cursor
        .next_nonblank()
        .ok_or((cursor.position(), ParseErrorKind::UnexpectedEof))?;
    let (state, latency) = parse_status(status)
        .ok_or_else(|| (status_line, ParseErrorKind::InvalidStatus(status.to_string())))?;

    let mut record = DiscoveryRecord {
        hostname,
        ip,
        status: state,
        mac: None,
        manufacturer: None,
        latency,
    };

    if let Some((mac_line, line)) = cursor.peek_nonblank()
        && let Some(rest) = line.strip_prefix(MAC_LINE)
    {
        cursor.advance_to(mac_line);
        let (mac, manufacturer) = parse_mac_line(rest)
            .ok_or_else(|| (mac_line, ParseErrorKind::InvalidMac(line.to_string())))?;
        record.mac = Some(mac);
        record.manufacturer = manufacturer;
    }

    Ok(record)
}

/// `name (ip)` or bare `ip`
fn parse_header(header: &str) -> Option<(Option<String>, IpAddr)> {
    let header = header.trim();

    if let Some(inner) = header.strip_suffix(')')
        && let Some(open) = inner.rfind(" (")
    {
        let ip = inner[open + 2..].parse().ok()?;
        let name = inner[..open].trim();
        let hostname = (!name.is_empty()).then(|| name.to_string());
        return Some((hostname, ip));
    }

    Some((None, header.parse().ok()?))
}

/// `Host is up (0.0010s latency).`, `Host is up.`, `Host is down.`
fn parse_status(line: &str) -> Option<(HostState, Option<Duration>)> {
    let rest = line.strip_prefix(STATUS)?;
    let word: String = rest.chars().take_while(|c| c.is_ascii_alphabetic()).collect();

    let state = match word.as_str() {
        "up" => HostState::Up,
        "down" => HostState::Down,
        _ => return None,
    };

    let latency = rest
        .rsplit_once('(')
        .and_then(|(_, tail)| tail.split_once("s latency)"))
        .and_then(|(secs, _)| secs.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

    Some((state, latency))
}

/// `AA:BB:CC:DD:EE:FF (Vendor Name)`
fn parse_mac_line(rest: &str) -> Option<(MacAddr, Option<String>)> {
    let rest = rest.trim();
    let (mac, vendor) = match rest.split_once(' ') {
        Some((mac, vendor)) => (mac, vendor.trim()),
        None => (rest, ""),
    };

    let mac: MacAddr = mac.parse().ok()?;
    let vendor = vendor
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(vendor)
        .trim();

    let manufacturer = match vendor {
        "" | "Unknown" => None,
        name => Some(name.to_string()),
    };

    Some((mac, manufacturer))
}

/// Line cursor with 1-based line numbers
struct Cursor<'a> {
    lines: Vec<&'a str>,
    next: usize,
}

impl<'a> Cursor<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            lines: raw.lines().map(str::trim).collect(),
            next: 0,
        }
    }

    /// Line number of the most recently consumed line
    fn position(&self) -> usize {
        self.next
    }

    fn peek_nonblank(&self) -> Option<(usize, &'a str)> {
        self.lines[self.next..]
            .iter()
            .enumerate()
            .find(|(_, line)| !line.is_empty())
            .map(|(offset, line)| (self.next + offset + 1, *line))
    }

    fn advance_to(&mut self, line_no: usize) {
        self.next = line_no;
    }

    fn next_nonblank(&mut self) -> Option<(usize, &'a str)> {
        let found = self.peek_nonblank();
        match found {
            Some((line_no, _)) => self.advance_to(line_no),
            None => self.next = self.lines.len(),
        }
        found
    }

    /// Next line that is neither blank nor tool noise
    fn next_significant(&mut self) -> Option<(usize, &'a str)> {
        loop {
            let (line_no, line) = self.next_nonblank()?;
            if !NOISE.iter().any(|prefix| line.starts_with(prefix)) {
                return Some((line_no, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER_LINE: &str = "Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC";
    const SUMMARY_LINE: &str = "Nmap done: 256 IP addresses (3 hosts up) scanned in 2.05 seconds";

    fn transcript(body: &[&str]) -> String {
        let mut lines = vec![BANNER_LINE];
        lines.extend_from_slice(body);
        lines.push(SUMMARY_LINE);
        lines.join("\n")
    }

    #[test]
    fn parses_blocks_in_order() {
        let raw = transcript(&[
            "Nmap scan report for router.lan (192.168.1.1)",
            "Host is up (0.0010s latency).",
            "MAC Address: AA:BB:CC:DD:EE:FF (Netgear)",
            "Nmap scan report for 192.168.1.20",
            "Host is up.",
            "Nmap scan report for printer (192.168.1.30)",
            "Host is up (0.25s latency).",
            "MAC Address: 00:11:22:33:44:55 (Unknown)",
        ]);

        let records = parse_sweep(&raw).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].hostname.as_deref(), Some("router.lan"));
        assert_eq!(records[0].ip, IpAddr::from([192, 168, 1, 1]));
        assert_eq!(records[0].status, HostState::Up);
        assert_eq!(records[0].mac.unwrap().to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(records[0].manufacturer.as_deref(), Some("Netgear"));
        assert_eq!(records[0].latency, Some(Duration::from_micros(1000)));

        assert_eq!(records[1].hostname, None);
        assert_eq!(records[1].ip, IpAddr::from([192, 168, 1, 20]));
        assert_eq!(records[1].mac, None);
        assert_eq!(records[1].latency, None);

        assert_eq!(records[2].hostname.as_deref(), Some("printer"));
        assert!(records[2].mac.is_some());
        assert_eq!(records[2].manufacturer, None);
    }

    #[test]
    fn banner_and_summary_only_is_empty() {
        let records = parse_sweep(&transcript(&[])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_summary_is_an_error() {
        let raw = [
            BANNER_LINE,
            "Nmap scan report for 10.0.0.5",
            "Host is up.",
        ]
        .join("\n");

        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.parsed().len(), 1);
    }

    #[test]
    fn empty_output_is_an_error() {
        let err = parse_sweep("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert!(err.parsed().is_empty());
    }

    #[test]
    fn block_cut_after_header_yields_no_partial_record() {
        let raw = [
            BANNER_LINE,
            "Nmap scan report for 10.0.0.5",
            "Host is up.",
            "Nmap scan report for 10.0.0.6",
        ]
        .join("\n");

        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        let parsed = err.into_parsed();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].ip, IpAddr::from([10, 0, 0, 5]));
    }

    #[test]
    fn unexpected_line_reports_its_number() {
        let raw = transcript(&["Nmap scan report for 10.0.0.5", "Host is up.", "garbage"]);
        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.kind, ParseErrorKind::UnexpectedLine("garbage".to_string()));
        assert_eq!(err.parsed().len(), 1);
    }

    #[test]
    fn bad_header_address_is_rejected() {
        let raw = transcript(&["Nmap scan report for somewhere (999.1.1.1)", "Host is up."]);
        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ParseErrorKind::InvalidAddress(_)));
    }

    #[test]
    fn garbled_status_is_rejected() {
        let raw = transcript(&["Nmap scan report for 10.0.0.5", "Host seems sideways."]);
        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ParseErrorKind::InvalidStatus(_)));
    }

    #[test]
    fn bad_mac_is_rejected() {
        let raw = transcript(&[
            "Nmap scan report for 10.0.0.5",
            "Host is up.",
            "MAC Address: AA:BB (Acme)",
        ]);
        let err = parse_sweep(&raw).unwrap_err();
        assert_eq!(err.line, 4);
        assert!(matches!(err.kind, ParseErrorKind::InvalidMac(_)));
        assert!(err.parsed().is_empty());
    }

    #[test]
    fn tolerates_blank_and_noise_lines() {
        let raw = transcript(&[
            "",
            "Warning: 10.0.0.1 giving up on port because retransmission cap hit (2).",
            "Nmap scan report for 10.0.0.5",
            "Host is down.",
            "",
            "Note: Host seems down. If it is really up, try -Pn",
        ]);
        let records = parse_sweep(&raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, HostState::Down);
    }

    #[test]
    fn received_reason_does_not_hide_latency() {
        let raw = transcript(&[
            "Nmap scan report for 10.0.0.5",
            "Host is up, received arp-response (0.00020s latency).",
        ]);
        let records = parse_sweep(&raw).unwrap();
        assert_eq!(records[0].status, HostState::Up);
        assert_eq!(records[0].latency, Some(Duration::from_micros(200)));
    }

    #[test]
    fn trailing_output_after_summary_is_ignored() {
        let mut raw = transcript(&["Nmap scan report for 10.0.0.5", "Host is up."]);
        raw.push_str("\nsomething else entirely");
        assert_eq!(parse_sweep(&raw).unwrap().len(), 1);
    }
}
