// Ordered shutdown of the accounting pipeline.

use crate::capture::{CaptureSummary, CaptureWorker};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Stops capture first, then signals the workers and waits for them.
///
/// The rotator's final flush runs after the capture thread has exited, so it sees every frame
/// that was classified.
pub async fn shut_down(
    capture: CaptureWorker,
    shutdown_tx: &watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
) -> anyhow::Result<CaptureSummary> {
    let summary = capture.stop().await;
    let _ = shutdown_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, operation = "shutdown", "worker task failed");
        }
    }
    summary
}
