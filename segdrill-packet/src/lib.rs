//! Symbolic TCP segment builder for segdrill
//!
//! This crate turns a script-level description of a TCP segment (flag
//! characters, sequence numbers, window, options, ECN codepoint, optional
//! UDP encapsulation) into a byte-exact packet buffer ready for port
//! binding and checksumming. It includes:
//!
//! - **Flag grammar** validation for tcpdump-style flag specs, with both
//!   the strict ACE and the permissive shorthand digit notations
//! - **Layout** computation with alignment and size ceilings
//! - **IPv4/IPv6**, **UDP** and **TCP** header writers driven by versioned
//!   field tables instead of struct overlays
//! - **Comparison hints** stamped on the packet for fields a script leaves
//!   open (window, options, timestamps, sequence numbers)
//!
//! # Architecture
//!
//! - [`flags`] - Flag spec validation and decoding
//! - [`layout`] - Header sizes and offsets
//! - [`wire`] - Bit-level field tables and the field writer
//! - [`ip`] - IP header writer
//! - [`udp`] - UDP header for encapsulated segments
//! - [`tcp`] - TCP flags, header and options
//! - [`builder`] - Packet assembly
//!
//! # Quick Start
//!
//! ```rust
//! use segdrill_core::{AddressFamily, Direction};
//! use segdrill_packet::TcpPacketBuilder;
//!
//! // a pure ACK with sequence number 1 and a window of 100
//! let packet = TcpPacketBuilder::new(AddressFamily::Inet, Direction::Outbound)
//!     .flags(".")
//!     .seq(1)
//!     .window(100)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(packet.len(), 40);
//! ```

pub mod builder;
pub mod flags;
pub mod ip;
pub mod layout;
pub mod tcp;
pub mod udp;
pub mod wire;

// Re-export commonly used types for convenience
pub use builder::{new_tcp_packet, TcpPacketBuilder, TcpSegmentSpec};
pub use ip::{set_packet_ip_header, IpProtocol};
pub use layout::{compute_layout, HeaderLayout};
pub use tcp::{TcpFlags, TcpHeader, TcpOptions, TcpOptionsBuilder};
pub use udp::UdpHeader;
