// Stats rotator: every interval, drain per-host counters and log the bidirectional talkers.
// On shutdown one last rotation flushes whatever accumulated since the previous tick.

use crate::engine::TrafficEngine;
use crate::models::StatsReport;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::time::{Duration, Instant, interval_at};
use tracing::Instrument;

pub struct RotatorConfig {
    pub interval: Duration,
}

/// Shared with the rest of the app for the final "exiting" summary.
#[derive(Debug, Default)]
pub struct RotatorStats {
    pub rotations: AtomicU64,
    pub lines_reported: AtomicU64,
}

/// Rotates once and logs the report. Used by the timer loop and the shutdown flush.
pub fn rotate_and_log(engine: &TrafficEngine, stats: &RotatorStats) -> StatsReport {
    let report = engine.rotate();
    report.log();
    stats.rotations.fetch_add(1, Ordering::Relaxed);
    stats
        .lines_reported
        .fetch_add(report.len() as u64, Ordering::Relaxed);
    tracing::debug!(
        operation = "rotate",
        reported = report.len(),
        unreported_in = report.unreported.inbound,
        unreported_out = report.unreported.outbound,
        total_bytes = engine.total_bytes(),
        "counters rotated"
    );
    report
}

pub fn spawn(
    engine: Arc<TrafficEngine>,
    stats: Arc<RotatorStats>,
    config: RotatorConfig,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let rotator_span = tracing::span!(
        tracing::Level::DEBUG,
        "rotator",
        interval_secs = config.interval.as_secs()
    );
    let task = async move {
        // First report one full interval after start, not immediately.
        let mut tick = interval_at(Instant::now() + config.interval, config.interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    rotate_and_log(&engine, &stats);
                }
                _ = shutdown.changed() => {
                    tracing::debug!("Rotator shutting down; flushing final report");
                    rotate_and_log(&engine, &stats);
                    break;
                }
            }
        }
    };
    tokio::spawn(task.instrument(rotator_span))
}
