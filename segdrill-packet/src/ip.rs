//! IP header construction
//!
//! Writes a minimal IPv4 or IPv6 header for a test packet. Addresses are
//! left zero and the IPv4 header checksum unset: the stage that binds the
//! packet to a connection fills them in before the packet hits the wire.

use crate::wire::{ipv4, ipv6, FieldWriter};
use segdrill_core::{AddressFamily, Error, HeaderKind, IpEcn, PacketBuf, Result};

/// Default TTL / hop limit of generated packets
pub const DEFAULT_TTL: u8 = 255;

/// IP Protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// ICMPv6 (58)
    ICMPv6,
    /// Custom protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::ICMPv6 => 58,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            58 => IpProtocol::ICMPv6,
            val => IpProtocol::Custom(val),
        }
    }
}

/// Write an IP header of `family` at the start of `buf`.
///
/// `total_len` is the whole datagram, IP header included. Only the fixed
/// header is written, so `buf` must hold at least that much.
pub fn write_ip_header(
    buf: &mut [u8],
    family: AddressFamily,
    total_len: usize,
    ecn: IpEcn,
    protocol: IpProtocol,
) -> Result<()> {
    match family {
        AddressFamily::Inet => {
            let header_len = family.ip_header_min_len();
            FieldWriter::new(&ipv4::HEADER_V1, buf)?
                .set(&ipv4::VERSION, 4)?
                .set(&ipv4::IHL, (header_len / 4) as u128)?
                .set(&ipv4::DSCP, 0)?
                .set(&ipv4::ECN, ecn.wire_bits().into())?
                .set(&ipv4::TOTAL_LENGTH, total_len as u128)?
                .set(&ipv4::IDENTIFICATION, 0)?
                .set(&ipv4::FLAGS, 0)?
                .set(&ipv4::FRAGMENT_OFFSET, 0)?
                .set(&ipv4::TTL, DEFAULT_TTL.into())?
                .set(&ipv4::PROTOCOL, protocol.to_u8().into())?
                .set(&ipv4::CHECKSUM, 0)?;
        }
        AddressFamily::Inet6 => {
            let payload_len = total_len
                .checked_sub(family.ip_header_min_len())
                .ok_or_else(|| {
                    Error::construction(format!(
                        "IPv6 datagram of {} bytes is shorter than its header",
                        total_len
                    ))
                })?;
            FieldWriter::new(&ipv6::HEADER_V1, buf)?
                .set(&ipv6::VERSION, 6)?
                .set(&ipv6::DSCP, 0)?
                .set(&ipv6::ECN, ecn.wire_bits().into())?
                .set(&ipv6::FLOW_LABEL, 0)?
                .set(&ipv6::PAYLOAD_LENGTH, payload_len as u128)?
                .set(&ipv6::NEXT_HEADER, protocol.to_u8().into())?
                .set(&ipv6::HOP_LIMIT, DEFAULT_TTL.into())?;
        }
    }
    Ok(())
}

/// Append the IP header region to `packet` and fill it in
pub fn set_packet_ip_header(
    packet: &mut PacketBuf,
    family: AddressFamily,
    ip_bytes: usize,
    ecn: IpEcn,
    protocol: IpProtocol,
) -> Result<()> {
    let header = packet.append_header(HeaderKind::Ip, family.ip_header_min_len(), ip_bytes)?;
    write_ip_header(header, family, ip_bytes, ecn, protocol)
}
