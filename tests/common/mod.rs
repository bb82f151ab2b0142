// Shared test helpers: fakes for the trait seams and packet builders
#![allow(dead_code)]

use netmon::engine::TrafficEngine;
use netmon::metrics::MetricsSink;
use netmon::models::Node;
use netmon::registry::{Ipv4Cidr, ReverseResolver};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// Resolver answering from a fixed table; everything else fails.
#[derive(Default)]
pub struct StaticResolver(pub HashMap<Ipv4Addr, String>);

impl StaticResolver {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(addr, name)| (ip(addr), name.to_string()))
                .collect(),
        )
    }
}

impl ReverseResolver for StaticResolver {
    fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String> {
        self.0.get(&ip).cloned()
    }
}

/// Sink that remembers every delta it was given.
#[derive(Default)]
pub struct RecordingSink {
    pub total: AtomicU64,
    pub nodes: Mutex<HashMap<String, u64>>,
}

impl RecordingSink {
    pub fn node(&self, hostname: &str) -> u64 {
        self.nodes
            .lock()
            .unwrap()
            .get(hostname)
            .copied()
            .unwrap_or(0)
    }
}

impl MetricsSink for RecordingSink {
    fn add_total(&self, bytes: u64) {
        self.total.fetch_add(bytes, Ordering::Relaxed);
    }

    fn add_node(&self, hostname: &str, bytes: u64) {
        *self
            .nodes
            .lock()
            .unwrap()
            .entry(hostname.to_string())
            .or_default() += bytes;
    }
}

/// Nodes for `cidr` with fallback hostnames, built without touching DNS.
pub fn nodes_for(cidr: &str) -> Vec<Node> {
    let cidr: Ipv4Cidr = cidr.parse().unwrap();
    cidr.hosts()
        .map(|ip| Node::new(ip, Node::fallback_hostname(ip)))
        .collect()
}

pub fn engine_for(cidr: &str) -> (TrafficEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = TrafficEngine::new(nodes_for(cidr), sink.clone());
    (engine, sink)
}

/// Ethernet II + IPv4 + UDP packet with `payload_len` zero bytes.
/// IPv4 total length is 28 + `payload_len`.
pub fn ethernet_udp_packet(src: Ipv4Addr, dst: Ipv4Addr, payload_len: usize) -> Vec<u8> {
    let builder = etherparse::PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [6, 5, 4, 3, 2, 1])
        .ipv4(src.octets(), dst.octets(), 64)
        .udp(40000, 53);
    let payload = vec![0u8; payload_len];
    let mut packet = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut packet, &payload).unwrap();
    packet
}
