// Link-layer → IPv4 header decoding. Only the header is needed, so snap-length truncated
// payloads still decode.

use crate::models::Ipv4Frame;
use etherparse::{EtherType, Ethernet2HeaderSlice, Ipv4HeaderSlice, SingleVlanHeaderSlice};

/// Linux cooked capture (SLL) header length; protocol type in the last two bytes.
const SLL_HEADER_LEN: usize = 16;

/// Link-layer framing of a capture handle, from its DLT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    /// No link header; the packet starts at the IP header.
    RawIp,
    LinuxSll,
    Unsupported(i32),
}

impl LinkLayer {
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkLayer::Ethernet,
            // DLT_RAW differs across platforms (12 or 14); 101 and 228 are the LINKTYPE values.
            12 | 14 | 101 | 228 => LinkLayer::RawIp,
            113 => LinkLayer::LinuxSll,
            other => LinkLayer::Unsupported(other),
        }
    }
}

/// Decodes a captured packet; `None` when it carries no IPv4 header.
pub fn decode_frame(link: LinkLayer, data: &[u8]) -> Option<Ipv4Frame> {
    match link {
        LinkLayer::Ethernet => decode_ethernet(data),
        LinkLayer::RawIp => decode_ipv4(data),
        LinkLayer::LinuxSll => decode_linux_sll(data),
        LinkLayer::Unsupported(_) => None,
    }
}

/// Ethernet II, optionally with a single 802.1Q tag.
pub fn decode_ethernet(data: &[u8]) -> Option<Ipv4Frame> {
    let eth = Ethernet2HeaderSlice::from_slice(data).ok()?;
    let rest = &data[eth.slice().len()..];
    match eth.ether_type() {
        EtherType::IPV4 => decode_ipv4(rest),
        EtherType::VLAN_TAGGED_FRAME => {
            let vlan = SingleVlanHeaderSlice::from_slice(rest).ok()?;
            if vlan.ether_type() != EtherType::IPV4 {
                return None;
            }
            decode_ipv4(&rest[vlan.slice().len()..])
        }
        _ => None,
    }
}

pub fn decode_linux_sll(data: &[u8]) -> Option<Ipv4Frame> {
    let header = data.get(..SLL_HEADER_LEN)?;
    let protocol = u16::from_be_bytes([header[14], header[15]]);
    if EtherType(protocol) != EtherType::IPV4 {
        return None;
    }
    decode_ipv4(&data[SLL_HEADER_LEN..])
}

/// Reads the IPv4 header at the start of `data`.
pub fn decode_ipv4(data: &[u8]) -> Option<Ipv4Frame> {
    let header = Ipv4HeaderSlice::from_slice(data).ok()?;
    Some(Ipv4Frame::new(
        header.source_addr(),
        header.destination_addr(),
        header.total_len(),
    ))
}
