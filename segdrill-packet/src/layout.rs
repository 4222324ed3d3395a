//! Header sizes and offsets of a TCP packet

use crate::ip::IpProtocol;
use crate::tcp::TCP_HEADER_BYTES;
use crate::udp::UDP_HEADER_BYTES;
use segdrill_core::{AddressFamily, BuilderConfig, Error, HeaderKind, Result};
use tracing::debug;

/// Sizes of the headers making up one TCP packet.
///
/// Buffer order is IP header, optional UDP header, TCP header with options,
/// then payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub family: AddressFamily,
    pub ip_header_bytes: usize,
    /// Present when the segment is tunnelled in UDP
    pub udp_header_bytes: Option<usize>,
    pub tcp_header_bytes: usize,
    pub tcp_payload_bytes: usize,
    pub total_bytes: usize,
}

impl HeaderLayout {
    /// Compute and check the layout.
    ///
    /// Option areas must keep their header on a 4-byte boundary, the TCP
    /// header must fit the data offset ceiling and the whole datagram the
    /// datagram ceiling of `config`. The datagram ceiling is further capped
    /// by what the family's 16-bit length field can carry.
    pub fn compute(
        family: AddressFamily,
        tcp_option_bytes: usize,
        udp_requested: bool,
        tcp_payload_bytes: usize,
        config: &BuilderConfig,
    ) -> Result<Self> {
        let ip_option_bytes = 0;
        if ip_option_bytes & 0x3 != 0 {
            return Err(Error::unaligned(HeaderKind::Ip, ip_option_bytes));
        }
        if tcp_option_bytes & 0x3 != 0 {
            return Err(Error::unaligned(HeaderKind::Tcp, tcp_option_bytes));
        }

        let ip_header_bytes = family.ip_header_min_len() + ip_option_bytes;
        let tcp_header_bytes = TCP_HEADER_BYTES.saturating_add(tcp_option_bytes);
        debug_assert_eq!(ip_header_bytes & 0x3, 0);

        if tcp_header_bytes > config.max_tcp_header_bytes {
            return Err(Error::HeaderTooLarge {
                bytes: tcp_header_bytes,
                max: config.max_tcp_header_bytes,
            });
        }

        let udp_header_bytes = udp_requested.then_some(UDP_HEADER_BYTES);
        let total_bytes = (ip_header_bytes + udp_header_bytes.unwrap_or(0))
            .saturating_add(tcp_header_bytes)
            .saturating_add(tcp_payload_bytes);
        let max_datagram_bytes = config
            .max_datagram_bytes
            .min(wire_datagram_limit(family, ip_header_bytes));
        if total_bytes > max_datagram_bytes {
            return Err(Error::DatagramTooLarge {
                bytes: total_bytes,
                max: max_datagram_bytes,
            });
        }

        let layout = HeaderLayout {
            family,
            ip_header_bytes,
            udp_header_bytes,
            tcp_header_bytes,
            tcp_payload_bytes,
            total_bytes,
        };
        debug!(
            family = %family,
            ip = layout.ip_header_bytes,
            udp = layout.udp_header_bytes.unwrap_or(0),
            tcp = layout.tcp_header_bytes,
            payload = layout.tcp_payload_bytes,
            total = layout.total_bytes,
            "computed TCP packet layout"
        );
        Ok(layout)
    }

    pub fn is_encapsulated(&self) -> bool {
        self.udp_header_bytes.is_some()
    }

    /// Protocol number the IP header announces
    pub fn upper_protocol(&self) -> IpProtocol {
        if self.is_encapsulated() {
            IpProtocol::UDP
        } else {
            IpProtocol::TCP
        }
    }

    /// Offset of the UDP header, if any
    pub fn udp_offset(&self) -> Option<usize> {
        self.udp_header_bytes.map(|_| self.ip_header_bytes)
    }

    /// Offset of the TCP header
    pub fn tcp_offset(&self) -> usize {
        self.ip_header_bytes + self.udp_header_bytes.unwrap_or(0)
    }

    /// TCP data offset field: header length in 32-bit words
    pub fn data_offset_words(&self) -> u8 {
        (self.tcp_header_bytes / 4) as u8
    }

    pub fn tcp_option_bytes(&self) -> usize {
        self.tcp_header_bytes - TCP_HEADER_BYTES
    }

    /// UDP length field: UDP header, TCP header and payload
    pub fn udp_datagram_bytes(&self) -> Option<usize> {
        self.udp_header_bytes
            .map(|udp| udp + self.tcp_header_bytes + self.tcp_payload_bytes)
    }

    /// TCP header plus payload
    pub fn tcp_segment_bytes(&self) -> usize {
        self.tcp_header_bytes + self.tcp_payload_bytes
    }
}

/// Largest datagram the IP length field of `family` can describe.
///
/// IPv4 counts the whole datagram in `tot_len`, IPv6 only what follows the
/// fixed header in `payload_len`.
fn wire_datagram_limit(family: AddressFamily, ip_header_bytes: usize) -> usize {
    let length_field_max = usize::from(u16::MAX);
    match family {
        AddressFamily::Inet => length_field_max,
        AddressFamily::Inet6 => ip_header_bytes + length_field_max,
    }
}

/// Compute the layout of a TCP packet; see [`HeaderLayout::compute`]
pub fn compute_layout(
    family: AddressFamily,
    tcp_option_bytes: usize,
    udp_requested: bool,
    tcp_payload_bytes: usize,
    config: &BuilderConfig,
) -> Result<HeaderLayout> {
    HeaderLayout::compute(family, tcp_option_bytes, udp_requested, tcp_payload_bytes, config)
}
