use crate::error::ConfigError;
use crate::registry::Ipv4Cidr;
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Config file names searched when neither `--config` nor `CONFIG_FILE` is set.
pub const SEARCH_PATHS: &[&str] = &["netmon.toml", "/etc/netmon.toml"];

/// Command-line flags. Device, CIDR and port given together skip the config file entirely.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "netmon", version, about = "Per-host IPv4 traffic accounting daemon")]
pub struct Cli {
    /// Name of the network device to monitor
    #[arg(long)]
    pub device: Option<String>,

    /// CIDR of the subnet to monitor
    #[arg(long)]
    pub cidr: Option<String>,

    /// Port on which metrics are exported
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<String>,
}

impl Cli {
    fn is_complete(&self) -> bool {
        self.device.is_some() && self.cidr.is_some() && self.port.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub exporter: ExporterConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub device: String,
    pub cidr: String,
    pub snapshot_len: i32,
    pub promiscuous: bool,
    /// Capture read timeout; bounds how long shutdown waits on an idle link.
    pub read_timeout_ms: i32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            cidr: String::new(),
            snapshot_len: 1024,
            promiscuous: true,
            read_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            port: 0,
            host: "0.0.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// How often per-host counters are reported and reset.
    pub stats_interval_secs: u64,
    /// How often the metrics endpoint is self-probed for the watchdog.
    pub health_interval_secs: u64,
    pub health_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 60,
            health_interval_secs: 15,
            health_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Max reverse-DNS lookups in flight while building the registry.
    pub concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl AppConfig {
    /// Assembles the config from flags, falling back to the config file when flags are incomplete.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = if cli.is_complete() {
            AppConfig::default()
        } else {
            match locate_config_file(cli.config.as_deref()) {
                Some(path) => Self::read_file(&path)?,
                None => AppConfig::default(),
            }
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&s)?)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(device) = &cli.device {
            self.network.device = device.clone();
        }
        if let Some(cidr) = &cli.cidr {
            self.network.cidr = cidr.clone();
        }
        if let Some(port) = cli.port {
            self.exporter.port = port;
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.device.is_empty() {
            return Err(ConfigError::Missing("network.device"));
        }
        if self.network.cidr.is_empty() {
            return Err(ConfigError::Missing("network.cidr"));
        }
        if self.exporter.port == 0 {
            return Err(ConfigError::Missing("exporter.port"));
        }
        self.network
            .cidr
            .parse::<Ipv4Cidr>()
            .map_err(|e| ConfigError::Invalid(format!("network.cidr: {e}")))?;
        ensure(
            self.network.snapshot_len > 0,
            format!(
                "network.snapshot_len must be > 0, got {}",
                self.network.snapshot_len
            ),
        )?;
        ensure(
            self.network.read_timeout_ms > 0,
            format!(
                "network.read_timeout_ms must be > 0, got {}",
                self.network.read_timeout_ms
            ),
        )?;
        ensure(
            !self.exporter.host.is_empty(),
            "exporter.host must be non-empty".to_string(),
        )?;
        ensure(
            self.logging.file.as_deref() != Some(""),
            "logging.file must be non-empty when set".to_string(),
        )?;
        ensure(
            self.schedule.stats_interval_secs > 0,
            format!(
                "schedule.stats_interval_secs must be > 0, got {}",
                self.schedule.stats_interval_secs
            ),
        )?;
        ensure(
            self.schedule.health_interval_secs > 0,
            format!(
                "schedule.health_interval_secs must be > 0, got {}",
                self.schedule.health_interval_secs
            ),
        )?;
        ensure(
            self.schedule.health_timeout_ms > 0,
            format!(
                "schedule.health_timeout_ms must be > 0, got {}",
                self.schedule.health_timeout_ms
            ),
        )?;
        ensure(
            self.resolver.concurrency > 0,
            format!(
                "resolver.concurrency must be > 0, got {}",
                self.resolver.concurrency
            ),
        )?;
        Ok(())
    }

    /// `host:port` for the metrics listener. IPv6 literals are bracketed.
    pub fn bind_addr(&self) -> String {
        join_host_port(&self.exporter.host, self.exporter.port)
    }

    /// URL the health prober hits: the bind host itself, or loopback when bound to a wildcard.
    pub fn probe_url(&self) -> String {
        let host = match parse_ip(&self.exporter.host) {
            Some(IpAddr::V4(ip)) if ip.is_unspecified() => Ipv4Addr::LOCALHOST.to_string(),
            Some(IpAddr::V6(ip)) if ip.is_unspecified() => Ipv6Addr::LOCALHOST.to_string(),
            _ => self.exporter.host.clone(),
        };
        format!("http://{}/metrics", join_host_port(&host, self.exporter.port))
    }
}

/// Accepts bare and bracketed IPv6 (`::1`, `[::1]`).
fn parse_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

fn join_host_port(host: &str, port: u16) -> String {
    match parse_ip(host) {
        Some(ip) => SocketAddr::new(ip, port).to_string(),
        None => format!("{host}:{port}"),
    }
}

fn ensure(cond: bool, msg: String) -> Result<(), ConfigError> {
    if cond {
        Ok(())
    } else {
        Err(ConfigError::Invalid(msg))
    }
}

/// Explicit path (flag, then `CONFIG_FILE`) wins; otherwise the first existing search path.
/// A missing explicit path is left for `read_file` to report.
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }
    SEARCH_PATHS.iter().map(PathBuf::from).find(|p| p.is_file())
}
