//! Common types used throughout segdrill

use std::fmt;

use crate::{Error, Result};

/// Network-layer address family of a built packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4 (20-byte minimum header)
    Inet,
    /// IPv6 (40-byte fixed header)
    Inet6,
}

impl AddressFamily {
    /// Minimum IP header length in bytes, without options
    pub const fn ip_header_min_len(self) -> usize {
        match self {
            AddressFamily::Inet => 20,
            AddressFamily::Inet6 => 40,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Inet => write!(f, "ipv4"),
            AddressFamily::Inet6 => write!(f, "ipv6"),
        }
    }
}

/// Which side of the test a packet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Injected by the test tool towards the stack under test
    Outbound,
    /// Expected to be sent by the stack under test
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Inbound => write!(f, "inbound"),
        }
    }
}

/// ECN codepoint carried in the IP header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IpEcn {
    /// Not-ECT (00)
    #[default]
    None,
    /// ECT(1) (01)
    Ect1,
    /// ECT(0) (10)
    Ect0,
    /// Congestion Experienced (11)
    Ce,
    /// Either ECT(0) or ECT(1) is acceptable when comparing
    Ect01,
}

impl IpEcn {
    /// Two-bit value emitted on the wire.
    ///
    /// `Ect01` is a comparison wildcard; outgoing bytes carry ECT(0).
    pub const fn wire_bits(self) -> u8 {
        match self {
            IpEcn::None => 0b00,
            IpEcn::Ect1 => 0b01,
            IpEcn::Ect0 | IpEcn::Ect01 => 0b10,
            IpEcn::Ce => 0b11,
        }
    }
}

/// Header kinds a packet buffer is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Ip,
    Udp,
    Tcp,
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderKind::Ip => write!(f, "IP"),
            HeaderKind::Udp => write!(f, "UDP"),
            HeaderKind::Tcp => write!(f, "TCP"),
        }
    }
}

/// TCP receive window as written in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// Not given; only allowed on outbound packets and never compared
    Unspecified,
    /// Explicit 16-bit window value
    Value(u16),
}

impl Window {
    /// Raw sentinel scripts use for an unspecified window
    pub const UNSPECIFIED_RAW: i64 = -1;

    /// Map a raw script value onto a window
    pub fn from_raw(raw: i64) -> Result<Self> {
        if raw == Self::UNSPECIFIED_RAW {
            return Ok(Window::Unspecified);
        }
        u16::try_from(raw)
            .map(Window::Value)
            .map_err(|_| Error::InvalidWindow(raw))
    }

    /// Value written into the header
    pub fn wire_value(self) -> u16 {
        match self {
            Window::Unspecified => 0,
            Window::Value(v) => v,
        }
    }

    pub fn is_specified(self) -> bool {
        matches!(self, Window::Value(_))
    }
}

impl From<u16> for Window {
    fn from(value: u16) -> Self {
        Window::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_header_min_len() {
        assert_eq!(AddressFamily::Inet.ip_header_min_len(), 20);
        assert_eq!(AddressFamily::Inet6.ip_header_min_len(), 40);
    }

    #[test]
    fn test_ecn_wire_bits() {
        assert_eq!(IpEcn::None.wire_bits(), 0);
        assert_eq!(IpEcn::Ect1.wire_bits(), 1);
        assert_eq!(IpEcn::Ect0.wire_bits(), 2);
        assert_eq!(IpEcn::Ce.wire_bits(), 3);
        assert_eq!(IpEcn::Ect01.wire_bits(), IpEcn::Ect0.wire_bits());
    }

    #[test]
    fn test_window_from_raw() {
        assert_eq!(Window::from_raw(-1).unwrap(), Window::Unspecified);
        assert_eq!(Window::from_raw(0).unwrap(), Window::Value(0));
        assert_eq!(Window::from_raw(65535).unwrap(), Window::Value(65535));
        assert_eq!(Window::from_raw(65536), Err(Error::InvalidWindow(65536)));
        assert_eq!(Window::from_raw(-2), Err(Error::InvalidWindow(-2)));
    }

    #[test]
    fn test_window_wire_value() {
        assert_eq!(Window::Unspecified.wire_value(), 0);
        assert_eq!(Window::from(100).wire_value(), 100);
        assert!(!Window::Unspecified.is_specified());
    }

    #[test]
    fn test_header_kind_display() {
        assert_eq!(HeaderKind::Ip.to_string(), "IP");
        assert_eq!(HeaderKind::Tcp.to_string(), "TCP");
    }
}
