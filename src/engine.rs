// Accounting engine: owns the node arena and the global counter.
// Classification runs on the capture thread; rotation runs on the rotator task.

use crate::counters::GlobalCounter;
use crate::metrics::MetricsSink;
use crate::models::{Ipv4Frame, Node, ReportLine, StatsReport};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Which registered nodes a frame was attributed to (indices into [`TrafficEngine::nodes`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attribution {
    /// Node whose address equals the frame's source; its outbound counter grew.
    pub source: Option<usize>,
    /// Node whose address equals the frame's destination; its inbound counter grew.
    pub destination: Option<usize>,
}

impl Attribution {
    pub fn is_unmatched(&self) -> bool {
        self.source.is_none() && self.destination.is_none()
    }
}

pub struct TrafficEngine {
    nodes: Vec<Node>,
    by_ip: HashMap<Ipv4Addr, usize>,
    total: GlobalCounter,
    sink: Arc<dyn MetricsSink>,
}

impl TrafficEngine {
    /// Takes ownership of the registry. Node addresses must be unique; a duplicate keeps the
    /// first index, which is what registry construction guarantees anyway.
    pub fn new(nodes: Vec<Node>, sink: Arc<dyn MetricsSink>) -> Self {
        let mut by_ip = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            by_ip.entry(node.ip).or_insert(i);
        }
        Self {
            nodes,
            by_ip,
            total: GlobalCounter::default(),
            sink,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, ip: Ipv4Addr) -> Option<&Node> {
        self.by_ip.get(&ip).map(|&i| &self.nodes[i])
    }

    /// Bytes seen across all IPv4 frames since startup.
    pub fn total_bytes(&self) -> u64 {
        self.total.get()
    }

    /// Accounts one IPv4 frame.
    ///
    /// The global counter always grows. Source and destination are matched independently, so a
    /// frame between two registered hosts (or from a host to itself) is charged to both sides.
    pub fn classify(&self, frame: &Ipv4Frame) -> Attribution {
        let len = u64::from(frame.length);
        self.total.add(len);
        self.sink.add_total(len);

        let source = self.by_ip.get(&frame.src).copied();
        if let Some(i) = source {
            let node = &self.nodes[i];
            node.counters().add_outbound(len);
            self.sink.add_node(&node.hostname, len);
        }

        let destination = self.by_ip.get(&frame.dst).copied();
        if let Some(i) = destination {
            let node = &self.nodes[i];
            node.counters().add_inbound(len);
            self.sink.add_node(&node.hostname, len);
        }

        Attribution {
            source,
            destination,
        }
    }

    /// Drains every node's counters and reports the ones that both sent and received.
    /// One-directional nodes are zeroed without a line; their bytes go to `unreported`.
    pub fn rotate(&self) -> StatsReport {
        let mut report = StatsReport::default();
        for node in &self.nodes {
            let pair = node.counters().take();
            if pair.is_bidirectional() {
                report.lines.push(ReportLine::new(node, pair));
            } else {
                report.unreported.inbound += pair.inbound;
                report.unreported.outbound += pair.outbound;
            }
        }
        report
    }
}
