// Tracing setup: local-time timestamps, RUST_LOG filter, stdout or a log file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

pub struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Installs the global subscriber. With `log_file` set, output is appended to that file through
/// a non-blocking writer; keep the returned guard alive until exit so buffered lines get flushed.
pub fn init(log_file: Option<&str>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter);

    let Some(log_file) = log_file else {
        builder.init();
        return Ok(None);
    };

    let path = Path::new(log_file);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {log_file}"))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    // Builder, not `rolling::never`: an unwritable path must come back as an error.
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder.with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}
