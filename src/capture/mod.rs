// Live capture: a pcap-backed frame source and the blocking capture-classify loop.

mod decode;

pub use decode::{LinkLayer, decode_ethernet, decode_frame, decode_ipv4, decode_linux_sll};

use crate::config::NetworkConfig;
use crate::engine::TrafficEngine;
use crate::error::CaptureError;
use crate::models::Ipv4Frame;
use pcap::{Active, Capture};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

/// Something that yields decoded frames.
///
/// `Ok(None)` means "nothing to account right now" (read timeout, non-IPv4 packet); the loop
/// just polls again. `Err` is terminal.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Ipv4Frame>, CaptureError>;
}

/// Promiscuous live capture on one device. The handle closes on drop.
pub struct PcapSource {
    capture: Capture<Active>,
    link: LinkLayer,
}

impl PcapSource {
    pub fn open(config: &NetworkConfig) -> Result<Self, CaptureError> {
        let open_err = |source: pcap::Error| CaptureError::Open {
            device: config.device.clone(),
            source,
        };
        let capture = Capture::from_device(config.device.as_str())
            .map_err(open_err)?
            .promisc(config.promiscuous)
            .snaplen(config.snapshot_len)
            .timeout(config.read_timeout_ms)
            .open()
            .map_err(open_err)?;
        let link = LinkLayer::from_dlt(capture.get_datalink().0);
        if let LinkLayer::Unsupported(dlt) = link {
            warn!(
                device = %config.device,
                dlt,
                "unsupported link type; no frames will be accounted"
            );
        }
        info!(
            device = %config.device,
            ?link,
            snapshot_len = config.snapshot_len,
            promiscuous = config.promiscuous,
            "capture device opened"
        );
        Ok(Self { capture, link })
    }
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<Option<Ipv4Frame>, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(decode_frame(self.link, packet.data)),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(CaptureError::Read(e)),
        }
    }
}

/// Counts from one run of [`run_capture_loop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: u64,
    pub unmatched: u64,
}

/// Feeds every frame from `source` to the engine until `stop` is set or the source fails.
///
/// Blocking; run it on a dedicated thread. `stop` is checked between reads, so shutdown latency
/// is bounded by the source's read timeout.
pub fn run_capture_loop<S: FrameSource>(
    mut source: S,
    engine: &TrafficEngine,
    stop: &AtomicBool,
) -> Result<CaptureSummary, CaptureError> {
    let mut summary = CaptureSummary::default();
    while !stop.load(Ordering::Relaxed) {
        let Some(frame) = source.next_frame()? else {
            continue;
        };
        summary.frames += 1;
        if engine.classify(&frame).is_unmatched() {
            summary.unmatched += 1;
        }
    }
    Ok(summary)
}

type CaptureOutcome = Result<Result<CaptureSummary, CaptureError>, JoinError>;

/// The capture loop running on the blocking pool, with the flag that stops it.
pub struct CaptureWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Result<CaptureSummary, CaptureError>>,
    outcome: Option<CaptureOutcome>,
}

impl CaptureWorker {
    pub fn spawn<S>(source: S, engine: Arc<TrafficEngine>) -> Self
    where
        S: FrameSource + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = stop.clone();
            tokio::task::spawn_blocking(move || run_capture_loop(source, &engine, &stop))
        };
        Self {
            stop,
            handle,
            outcome: None,
        }
    }

    /// Resolves when the loop ends on its own (read error). Cancel-safe; the outcome is kept
    /// for [`CaptureWorker::stop`].
    pub async fn finished(&mut self) {
        if self.outcome.is_none() {
            self.outcome = Some((&mut self.handle).await);
        }
    }

    /// Stops the loop and waits for it; once this returns no further frame can be classified.
    pub async fn stop(mut self) -> anyhow::Result<CaptureSummary> {
        self.stop.store(true, Ordering::Relaxed);
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.handle.await,
        };
        Ok(outcome??)
    }
}
