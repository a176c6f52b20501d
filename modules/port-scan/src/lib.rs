//! Sequential TCP connect probe of an inclusive port range on a single IPv4 host.

mod services;

pub use services::ServiceTable;

use log::{debug, info};
use regex::Regex;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use toolbox_core::Target;

/// Connect timeout applied to every port unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid hostname")]
    InvalidHostname,
    #[error("Invalid IP address")]
    InvalidIp,
    #[error("invalid port range: {0}")]
    InvalidRange(String),
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        ProbeError::Other(e.to_string())
    }
}

/// Inclusive `[start, end]` port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ProbeError> {
        if start > end {
            return Err(ProbeError::InvalidRange(format!("{}-{}", start, end)));
        }
        Ok(PortRange { start, end })
    }

    pub fn single(port: u16) -> Self { PortRange { start: port, end: port } }

    pub fn start(&self) -> u16 { self.start }

    pub fn end(&self) -> u16 { self.end }

    /// Ports in ascending order.
    pub fn iter(&self) -> RangeInclusive<u16> { self.start..=self.end }

    pub fn len(&self) -> usize { usize::from(self.end - self.start) + 1 }

    /// Always false: a range holds at least its start port.
    pub fn is_empty(&self) -> bool { false }
}

impl TryFrom<&[u16]> for PortRange {
    type Error = ProbeError;

    /// Accepts exactly `[start, end]`.
    fn try_from(bounds: &[u16]) -> Result<Self, Self::Error> {
        let &[start, end] = bounds else {
            return Err(ProbeError::InvalidRange(format!("expected [start, end], got {:?}", bounds)));
        };
        PortRange::new(start, end)
    }
}

impl FromStr for PortRange {
    type Err = ProbeError;

    /// Parse `"start-end"` or a single `"port"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ProbeError::InvalidRange(s.to_string());
        match s.split_once('-') {
            Some((a, b)) => {
                let a: u16 = a.trim().parse().map_err(|_| bad())?;
                let b: u16 = b.trim().parse().map_err(|_| bad())?;
                PortRange::new(a, b)
            }
            None => s.parse().map(PortRange::single).map_err(|_| bad()),
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self { ScanOptions { timeout: DEFAULT_TIMEOUT } }
}

/// Ports that accepted a connection, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub target: Target,
    pub address: Ipv4Addr,
    pub open: Vec<u16>,
}

impl ScanResult {
    pub fn report(&self, services: &ServiceTable) -> String {
        format_verbose_output(&self.target.0, self.address, &self.open, services)
    }
}

/// What `probe` hands back: the bare port list, or the rendered report in verbose mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutput {
    Ports(Vec<u16>),
    Report(String),
}

impl fmt::Display for ScanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutput::Ports(ports) => write!(f, "{:?}", ports),
            ScanOutput::Report(report) => f.write_str(report),
        }
    }
}

fn dotted_quad() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").unwrap())
}

/// Dotted-quad shape only; octet values are not checked.
pub fn looks_like_ipv4(s: &str) -> bool {
    dotted_quad().is_match(s)
}

fn parse_octets(s: &str) -> Option<[u8; 4]> {
    if !looks_like_ipv4(s) { return None; }
    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(s.split('.')) {
        *slot = part.parse().ok()?;
    }
    Some(octets)
}

/// True for four dot-separated decimal groups, each in `0..=255`.
pub fn is_valid_ip(s: &str) -> bool {
    parse_octets(s).is_some()
}

/// Turn a target into the one IPv4 address that will be probed.
///
/// Dotted-quad input never touches DNS: it is either a valid address or `InvalidIp`.
/// Everything else is treated as a hostname and must resolve to at least one IPv4
/// address, otherwise `InvalidHostname`.
pub async fn resolve_target(target: &str) -> Result<Ipv4Addr, ProbeError> {
    if looks_like_ipv4(target) {
        return parse_octets(target).map(Ipv4Addr::from).ok_or(ProbeError::InvalidIp);
    }
    let addrs = tokio::net::lookup_host((target, 0u16))
        .await
        .map_err(|e| {
            debug!("resolving {} failed: {}", target, e);
            ProbeError::InvalidHostname
        })?;
    addrs
        .filter_map(|sa| match sa.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or(ProbeError::InvalidHostname)
}

/// One connect attempt. The stream is dropped straight away.
pub async fn probe_port(address: Ipv4Addr, port: u16, timeout_per_port: Duration) -> bool {
    let addr = SocketAddr::from((address, port));
    matches!(timeout(timeout_per_port, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

/// Resolve once, then try every port of the range in ascending order, one at a time.
/// The result keeps the target exactly as given; only resolution sees it trimmed.
pub async fn scan(target: &str, range: PortRange, opts: &ScanOptions) -> Result<ScanResult, ProbeError> {
    let t: Target = target.into();
    let address = resolve_target(t.0.trim()).await?;
    info!("scanning {} ({}) ports {} with {:?} timeout", t, address, range, opts.timeout);
    let mut open = Vec::new();
    for port in range.iter() {
        if probe_port(address, port, opts.timeout).await {
            debug!("{}:{} open", address, port);
            open.push(port);
        }
    }
    info!("{} ({}): {} of {} ports open", t, address, open.len(), range.len());
    Ok(ScanResult { target: t, address, open })
}

/// Scan and shape the result: ports only, or the verbose report.
pub async fn probe(target: &str, range: PortRange, verbose: bool) -> Result<ScanOutput, ProbeError> {
    probe_with(target, range, verbose, ServiceTable::builtin(), &ScanOptions::default()).await
}

pub async fn probe_with(
    target: &str,
    range: PortRange,
    verbose: bool,
    services: &ServiceTable,
    opts: &ScanOptions,
) -> Result<ScanOutput, ProbeError> {
    let result = scan(target, range, opts).await?;
    if verbose {
        Ok(ScanOutput::Report(result.report(services)))
    } else {
        Ok(ScanOutput::Ports(result.open))
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, ProbeError> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}

/// Blocking form of [`scan`] for callers without a runtime.
pub fn scan_blocking(target: &str, range: PortRange, opts: &ScanOptions) -> Result<ScanResult, ProbeError> {
    runtime()?.block_on(scan(target, range, opts))
}

/// Blocking form of [`probe`] for callers without a runtime.
pub fn probe_blocking(target: &str, range: PortRange, verbose: bool) -> Result<ScanOutput, ProbeError> {
    runtime()?.block_on(probe(target, range, verbose))
}

/// Render the verbose report; trailing whitespace is trimmed.
pub fn format_verbose_output(
    target: &str,
    address: impl fmt::Display,
    open: &[u16],
    services: &ServiceTable,
) -> String {
    let mut out = format!("Open ports for {} ({})\nPORT     SERVICE\n", target, address);
    for &port in open {
        out.push_str(&format!("{:<8} {}\n", port, services.name_or_unknown(port)));
    }
    out.truncate(out.trim_end().len());
    out
}
