// Typed errors for config, registry and capture. Application edges use anyhow.

use std::path::PathBuf;

/// Configuration could not be assembled from flags and/or the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting was given neither on the command line nor in the file.
    #[error("{0} not specified")]
    Missing(&'static str),

    /// An explicitly named config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting is present but out of range.
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid CIDR {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },
}

impl RegistryError {
    pub(crate) fn invalid(cidr: &str, reason: impl Into<String>) -> Self {
        RegistryError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The device could not be opened; fatal at startup.
    #[error("failed to open capture device {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: pcap::Error,
    },

    /// Reading from an open device failed; ends the capture loop.
    #[error("capture read failed: {0}")]
    Read(#[source] pcap::Error),
}
