// Host registry: enumerate a subnet's hosts once at startup and name them via reverse DNS.

use crate::error::RegistryError;
use crate::models::Node;
use futures_util::StreamExt;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// An IPv4 subnet in `a.b.c.d/len` form, normalized to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, RegistryError> {
        if prefix_len > 32 {
            return Err(RegistryError::invalid(
                &format!("{addr}/{prefix_len}"),
                "prefix length must be at most 32",
            ));
        }
        let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
        Ok(Self {
            network: Ipv4Addr::from(u32::from(addr) & mask),
            prefix_len,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Addresses covered by the prefix, network address included: 2^(32 - len).
    pub fn host_count(&self) -> u64 {
        1u64 << (32 - self.prefix_len as u32)
    }

    /// Monitored addresses: offsets `1..host_count` from the network address, ascending.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let base = u32::from(self.network) as u64;
        (1..self.host_count()).map(move |offset| Ipv4Addr::from((base + offset) as u32))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| RegistryError::invalid(s, "missing '/<prefix length>'"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|e| RegistryError::invalid(s, format!("bad address: {e}")))?;
        // Plain decimal only: `u8::from_str` would also take "+24" and "024".
        if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RegistryError::invalid(s, "prefix length must be decimal digits"));
        }
        if len.len() > 1 && len.starts_with('0') {
            return Err(RegistryError::invalid(s, "prefix length has leading zeros"));
        }
        let len: u8 = len
            .parse()
            .map_err(|e| RegistryError::invalid(s, format!("bad prefix length: {e}")))?;
        Self::new(addr, len)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Reverse (PTR) resolution seam; blocking, called from the blocking pool.
pub trait ReverseResolver: Send + Sync + 'static {
    /// First name for `ip`, or `None` when the address does not resolve.
    fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String>;
}

/// Resolves through the system resolver (getnameinfo).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl ReverseResolver for SystemResolver {
    fn reverse_lookup(&self, ip: Ipv4Addr) -> Option<String> {
        match dns_lookup::lookup_addr(&IpAddr::V4(ip)) {
            // getnameinfo falls back to the numeric form when there is no PTR record.
            Ok(name) if name == ip.to_string() => None,
            Ok(name) => Some(name),
            Err(e) => {
                debug!(%ip, error = %e, "reverse lookup failed");
                None
            }
        }
    }
}

/// Builds the node list for `cidr` in ascending address order.
///
/// Up to `concurrency` lookups run at once on the blocking pool; results are collected in
/// submission order so the output does not depend on which lookup finishes first.
pub async fn build_nodes(
    cidr: &Ipv4Cidr,
    resolver: Arc<dyn ReverseResolver>,
    concurrency: usize,
) -> Vec<Node> {
    futures_util::stream::iter(cidr.hosts())
        .map(|ip| {
            let resolver = resolver.clone();
            async move {
                let name = tokio::task::spawn_blocking(move || resolver.reverse_lookup(ip))
                    .await
                    .ok()
                    .flatten()
                    .filter(|n| !n.is_empty());
                let hostname = name.unwrap_or_else(|| Node::fallback_hostname(ip));
                debug!(address = %ip, %hostname, "registered host");
                Node::new(ip, hostname)
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Parses `cidr` and builds the registry for it. The device name is only logged.
pub async fn build_registry(
    cidr: &str,
    device: &str,
    resolver: Arc<dyn ReverseResolver>,
    concurrency: usize,
) -> Result<Vec<Node>, RegistryError> {
    let cidr: Ipv4Cidr = cidr.parse()?;
    let started = std::time::Instant::now();
    let nodes = build_nodes(&cidr, resolver, concurrency).await;
    let resolved = nodes
        .iter()
        .filter(|n| n.hostname != Node::fallback_hostname(n.ip))
        .count();
    info!(
        device,
        cidr = %cidr,
        hosts = nodes.len(),
        resolved,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "host registry built"
    );
    Ok(nodes)
}
