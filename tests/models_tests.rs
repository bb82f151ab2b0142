// Report formatting, counter drain semantics and node construction

use netmon::counters::{CounterPair, GlobalCounter, NodeCounters};
use netmon::models::{Node, ReportLine, StatsReport};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn test_node_new_derives_address_from_ip() {
    let ip: Ipv4Addr = "10.1.2.3".parse().unwrap();
    let node = Node::new(ip, "printer.lan");
    assert_eq!(node.address, "10.1.2.3");
    assert_eq!(node.ip, ip);
    assert_eq!(node.hostname, "printer.lan");
    assert_eq!((node.inbound(), node.outbound()), (0, 0));
}

#[test]
fn test_report_line_scales_to_kilobytes() {
    let node = Node::new("10.0.0.7".parse().unwrap(), "laptop");
    let line = ReportLine::new(
        &node,
        CounterPair {
            inbound: 1_234_567,
            outbound: 50,
        },
    );
    assert_eq!(line.inbound_kb(), 1234.567);
    assert_eq!(line.outbound_kb(), 0.05);

    let text = line.to_string();
    assert!(text.starts_with("10.0.0.7         "));
    assert!(text.contains("laptop"));
    assert!(text.contains("1234.6"));
    assert!(text.contains("0.1"));
    assert_eq!(text.matches('k').count(), 2);
}

#[test]
fn test_report_line_column_layout() {
    let node = Node::new("10.0.0.1".parse().unwrap(), "a");
    let line = ReportLine::new(
        &node,
        CounterPair {
            inbound: 1000,
            outbound: 2000,
        },
    );
    let expected = format!(
        "{:<16}   {:<30}    {:<10}k    {:<10}k",
        "10.0.0.1", "a", "1.0", "2.0"
    );
    assert_eq!(line.to_string(), expected);
}

#[test]
fn test_report_serializes_camel_case() {
    let node = Node::new("10.0.0.1".parse().unwrap(), "a");
    let report = StatsReport {
        lines: vec![ReportLine::new(
            &node,
            CounterPair {
                inbound: 1,
                outbound: 2,
            },
        )],
        ..Default::default()
    };
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"inboundBytes\":1"));
    assert!(json.contains("\"outboundBytes\":2"));
}

#[test]
fn test_counter_pair_bidirectional() {
    let pair = |inbound, outbound| CounterPair { inbound, outbound };
    assert!(pair(1, 1).is_bidirectional());
    assert!(!pair(1, 0).is_bidirectional());
    assert!(!pair(0, 1).is_bidirectional());
    assert!(!pair(0, 0).is_bidirectional());
}

#[test]
fn test_node_counters_take_resets() {
    let counters = NodeCounters::default();
    counters.add_inbound(10);
    counters.add_outbound(3);
    counters.add_inbound(5);
    assert_eq!(
        counters.take(),
        CounterPair {
            inbound: 15,
            outbound: 3
        }
    );
    assert_eq!(counters.load(), CounterPair::default());
}

#[test]
fn test_global_counter_accumulates() {
    let total = GlobalCounter::default();
    total.add(7);
    total.add(8);
    assert_eq!(total.get(), 15);
}

#[test]
fn test_node_counters_concurrent_writers_and_drainer() {
    const PER_WRITER: u64 = 20_000;
    let counters = Arc::new(NodeCounters::default());
    let done = Arc::new(AtomicBool::new(false));

    let drainer = {
        let counters = counters.clone();
        let done = done.clone();
        std::thread::spawn(move || {
            let mut sum = CounterPair::default();
            while !done.load(Ordering::Acquire) {
                let taken = counters.take();
                sum.inbound += taken.inbound;
                sum.outbound += taken.outbound;
            }
            sum
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let counters = counters.clone();
            std::thread::spawn(move || {
                for _ in 0..PER_WRITER {
                    counters.add_inbound(3);
                    counters.add_outbound(1);
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let drained = drainer.join().unwrap();
    let residual = counters.take();
    assert_eq!(drained.inbound + residual.inbound, 4 * PER_WRITER * 3);
    assert_eq!(drained.outbound + residual.outbound, 4 * PER_WRITER);
}
