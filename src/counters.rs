// Lock-free byte accumulators shared by the classifier (writer) and the rotator (drainer).

use std::sync::atomic::{AtomicU64, Ordering};

/// Inbound/outbound byte pair for one node.
///
/// The classifier only adds; the rotator only drains with `take`. Each field is drained with an
/// atomic swap, so an increment lands either in the value a given `take` returns or in the next
/// one, never in both and never in neither.
#[derive(Debug, Default)]
pub struct NodeCounters {
    inbound: AtomicU64,
    outbound: AtomicU64,
}

/// Values drained from a [`NodeCounters`] by one rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterPair {
    pub inbound: u64,
    pub outbound: u64,
}

impl CounterPair {
    /// True when the node both sent and received traffic in the interval.
    pub fn is_bidirectional(&self) -> bool {
        self.inbound != 0 && self.outbound != 0
    }
}

impl NodeCounters {
    pub fn add_inbound(&self, bytes: u64) {
        self.inbound.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_outbound(&self, bytes: u64) {
        self.outbound.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Current values without resetting.
    pub fn load(&self) -> CounterPair {
        CounterPair {
            inbound: self.inbound.load(Ordering::Relaxed),
            outbound: self.outbound.load(Ordering::Relaxed),
        }
    }

    /// Reads and zeroes both directions.
    pub fn take(&self) -> CounterPair {
        CounterPair {
            inbound: self.inbound.swap(0, Ordering::AcqRel),
            outbound: self.outbound.swap(0, Ordering::AcqRel),
        }
    }
}

/// Total bytes seen across all IPv4 frames; never reset.
#[derive(Debug, Default)]
pub struct GlobalCounter(AtomicU64);

impl GlobalCounter {
    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
