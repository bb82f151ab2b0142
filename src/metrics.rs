// Metrics sink: write-only byte counters, exported in the Prometheus text format.

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub const NETWORK_BYTES_TOTAL: &str = "network_bytes_total";
pub const NODE_BYTES_TOTAL: &str = "node_bytes_total";
/// Label carrying the node's hostname on `node_bytes_total`.
pub const NODE_LABEL: &str = "device";

/// What the classifier forwards byte deltas to. Never read back by the engine.
pub trait MetricsSink: Send + Sync {
    fn add_total(&self, bytes: u64);
    fn add_node(&self, hostname: &str, bytes: u64);
}

/// Prometheus-backed sink with its own registry.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    network_bytes: IntCounter,
    node_bytes: IntCounterVec,
}

impl PrometheusSink {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let network_bytes =
            IntCounter::new(NETWORK_BYTES_TOTAL, "Number of bytes seen on the network.")?;
        let node_bytes = IntCounterVec::new(
            Opts::new(NODE_BYTES_TOTAL, "Number of bytes seen on that network node."),
            &[NODE_LABEL],
        )?;
        registry.register(Box::new(network_bytes.clone()))?;
        registry.register(Box::new(node_bytes.clone()))?;
        Ok(Self {
            registry,
            network_bytes,
            node_bytes,
        })
    }

    /// Renders every registered family in the text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn network_bytes(&self) -> u64 {
        self.network_bytes.get()
    }

    /// Current `node_bytes_total` for `hostname`, or `None` if no bytes were ever charged to it.
    /// Reads the collected families so an unknown label does not create a series.
    pub fn node_bytes(&self, hostname: &str) -> Option<u64> {
        self.node_bytes
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == NODE_LABEL && pair.get_value() == hostname)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
    }
}

impl MetricsSink for PrometheusSink {
    fn add_total(&self, bytes: u64) {
        self.network_bytes.inc_by(bytes);
    }

    fn add_node(&self, hostname: &str, bytes: u64) {
        self.node_bytes.with_label_values(&[hostname]).inc_by(bytes);
    }
}
