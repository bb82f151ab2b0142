// Domain models: monitored nodes, decoded frames, rotation reports

use crate::counters::{CounterPair, NodeCounters};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// One monitored host. Identity is fixed at registry build; only the counters change.
#[derive(Debug)]
pub struct Node {
    pub address: String,
    pub ip: Ipv4Addr,
    pub hostname: String,
    counters: NodeCounters,
}

impl Node {
    pub fn new(ip: Ipv4Addr, hostname: impl Into<String>) -> Self {
        Self {
            address: ip.to_string(),
            ip,
            hostname: hostname.into(),
            counters: NodeCounters::default(),
        }
    }

    /// Synthetic name used when reverse resolution yields nothing.
    pub fn fallback_hostname(ip: Ipv4Addr) -> String {
        format!("unknown-{ip}")
    }

    pub fn counters(&self) -> &NodeCounters {
        &self.counters
    }

    pub fn inbound(&self) -> u64 {
        self.counters.load().inbound
    }

    pub fn outbound(&self) -> u64 {
        self.counters.load().outbound
    }
}

/// Network-layer view of a captured datagram: the only fields accounting needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Frame {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    /// IPv4 total length (header + payload), in bytes.
    pub length: u16,
}

impl Ipv4Frame {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, length: u16) -> Self {
        Self { src, dst, length }
    }
}

/// One bidirectional talker in a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub address: String,
    pub hostname: String,
    pub inbound_bytes: u64,
    pub outbound_bytes: u64,
}

impl ReportLine {
    pub fn new(node: &Node, pair: CounterPair) -> Self {
        Self {
            address: node.address.clone(),
            hostname: node.hostname.clone(),
            inbound_bytes: pair.inbound,
            outbound_bytes: pair.outbound,
        }
    }

    pub fn inbound_kb(&self) -> f64 {
        self.inbound_bytes as f64 / 1000.0
    }

    pub fn outbound_kb(&self) -> f64 {
        self.outbound_bytes as f64 / 1000.0
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16}   {:<30}    {:<10.1}k    {:<10.1}k",
            self.address,
            self.hostname,
            self.inbound_kb(),
            self.outbound_kb(),
        )
    }
}

/// Output of one rotation, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    pub lines: Vec<ReportLine>,
    /// Bytes drained from one-directional nodes; zeroed without a line.
    #[serde(skip)]
    pub unreported: CounterPair,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Writes the summary block to the log: a header, then one line per talker.
    pub fn log(&self) {
        tracing::info!("------------------- Summary Stats -------------------");
        for line in &self.lines {
            tracing::info!("{}", line);
        }
    }
}
