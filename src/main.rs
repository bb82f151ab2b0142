use anyhow::Result;
use clap::Parser;
use netmon::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::watch;
use tokio::time::Duration;

/// Exit status when required configuration is missing or invalid.
const EXIT_CONFIG: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = config::Cli::parse();
    let app_config = match config::AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // Held until return so the file writer flushes the final report.
    let _log_guard = match logging::init(app_config.logging.file.as_deref()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to initialise logging: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(app_config: config::AppConfig) -> Result<()> {
    let network = &app_config.network;
    let cidr: registry::Ipv4Cidr = network.cidr.parse()?;
    tracing::info!(
        device = %network.device,
        cidr = %network.cidr,
        num_hosts = cidr.host_count(),
        base_addr = %cidr.network(),
        port = app_config.exporter.port,
        version = version::VERSION,
        "Startup"
    );

    let source = capture::PcapSource::open(network)?;

    let nodes = registry::build_registry(
        &network.cidr,
        &network.device,
        Arc::new(registry::SystemResolver),
        app_config.resolver.concurrency,
    )
    .await?;
    let sink = Arc::new(metrics::PrometheusSink::new()?);
    let engine = Arc::new(engine::TrafficEngine::new(nodes, sink.clone()));

    let addr = app_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server_shutdown = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, routes::app(sink))
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    let supervisor: Arc<dyn supervisor::Supervisor> = Arc::new(supervisor::SystemdSupervisor);
    if let Err(e) = supervisor.ready() {
        tracing::warn!(error = %e, operation = "notify_ready", "supervisor notification failed");
    }

    let rotator_stats = Arc::new(rotator::RotatorStats::default());
    let rotator_handle = rotator::spawn(
        engine.clone(),
        rotator_stats.clone(),
        rotator::RotatorConfig {
            interval: Duration::from_secs(app_config.schedule.stats_interval_secs),
        },
        shutdown_rx.clone(),
    );

    let probe = health::HealthProbe::new(
        app_config.probe_url(),
        Duration::from_millis(app_config.schedule.health_timeout_ms),
    )?;
    let health_handle = health::spawn(
        probe,
        supervisor,
        health::HealthConfig {
            interval: Duration::from_secs(app_config.schedule.health_interval_secs),
        },
        shutdown_rx,
    );

    let mut capture = capture::CaptureWorker::spawn(source, engine.clone());

    tokio::select! {
        _ = capture.finished() => {}
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }

    let capture_result =
        lifecycle::shut_down(capture, &shutdown_tx, vec![rotator_handle, health_handle]).await;
    match server_handle.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "metrics server exited with error"),
        Err(e) => tracing::warn!(error = %e, "metrics server task failed"),
        Ok(Ok(())) => {}
    }

    tracing::info!(
        total_bytes = engine.total_bytes(),
        rotations = rotator_stats.rotations.load(Ordering::Relaxed),
        lines_reported = rotator_stats.lines_reported.load(Ordering::Relaxed),
        "exiting"
    );

    let summary = capture_result?;
    tracing::info!(
        frames = summary.frames,
        unmatched = summary.unmatched,
        "capture closed"
    );
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
