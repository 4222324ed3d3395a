//! TCP packet assembly
//!
//! Turns a symbolic segment description into a packet buffer: the flag
//! spec is validated, the layout computed, then the IP, optional UDP and
//! TCP headers are written back to back into one zero-filled buffer.
//! Ports and checksums are left zero for the connection binding stage.

use crate::flags;
use crate::ip::set_packet_ip_header;
use crate::layout::HeaderLayout;
use crate::tcp::{TcpHeader, TcpOptions};
use crate::udp::UdpHeader;
use segdrill_core::{
    AddressFamily, BuilderConfig, Direction, Error, HeaderKind, IpEcn, Packet, PacketBuf,
    PacketHints, Result, Window,
};
use tracing::debug;

/// Everything needed to build one TCP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegmentSpec {
    pub family: AddressFamily,
    pub direction: Direction,
    pub ecn: IpEcn,
    /// tcpdump-style flag characters, e.g. `"S."`
    pub flags: String,
    pub start_sequence: u32,
    pub tcp_payload_bytes: u16,
    pub ack_sequence: u32,
    pub window: Window,
    /// `None` means the options are not compared
    pub tcp_options: Option<TcpOptions>,
    pub ignore_ts_val: bool,
    pub abs_ts_ecr: bool,
    pub abs_seq: bool,
    pub ignore_seq: bool,
    /// Non-zero UDP ports tunnel the segment in UDP
    pub udp_src_port: u16,
    pub udp_dst_port: u16,
}

impl TcpSegmentSpec {
    pub fn new(family: AddressFamily, direction: Direction) -> Self {
        TcpSegmentSpec {
            family,
            direction,
            ecn: IpEcn::None,
            flags: String::new(),
            start_sequence: 0,
            tcp_payload_bytes: 0,
            ack_sequence: 0,
            window: Window::Unspecified,
            tcp_options: None,
            ignore_ts_val: false,
            abs_ts_ecr: false,
            abs_seq: false,
            ignore_seq: false,
            udp_src_port: 0,
            udp_dst_port: 0,
        }
    }

    pub fn is_encapsulated(&self) -> bool {
        self.udp_src_port > 0 || self.udp_dst_port > 0
    }

    fn hints(&self) -> PacketHints {
        let mut hints = PacketHints::empty();
        hints.set(PacketHints::UDP_ENCAPSULATED, self.is_encapsulated());
        hints.set(PacketHints::WINDOW_UNCHECKED, !self.window.is_specified());
        hints.set(PacketHints::OPTIONS_UNCHECKED, self.tcp_options.is_none());
        hints.set(PacketHints::IGNORE_TS_VAL, self.ignore_ts_val);
        hints.set(PacketHints::ABSOLUTE_TS_ECR, self.abs_ts_ecr);
        hints.set(PacketHints::ABSOLUTE_SEQ, self.abs_seq);
        hints.set(PacketHints::IGNORE_SEQ, self.ignore_seq);
        hints
    }

    /// Build the packet described by this spec
    pub fn build(&self, config: &BuilderConfig) -> Result<Packet> {
        let tcp_flags = flags::parse(&self.flags, config.grammar)?;

        let option_bytes = self.tcp_options.as_ref().map_or(0, TcpOptions::len);
        let layout = HeaderLayout::compute(
            self.family,
            option_bytes,
            self.is_encapsulated(),
            self.tcp_payload_bytes.into(),
            config,
        )?;

        // an unspecified window is only legal on packets the tool injects
        if self.direction == Direction::Inbound && !self.window.is_specified() {
            return Err(Error::WindowRequired);
        }

        let mut packet = PacketBuf::new(layout.total_bytes, self.direction, self.ecn);
        set_packet_ip_header(
            &mut packet,
            self.family,
            layout.total_bytes,
            self.ecn,
            layout.upper_protocol(),
        )?;

        if let (Some(udp_bytes), Some(datagram_bytes)) =
            (layout.udp_header_bytes, layout.udp_datagram_bytes())
        {
            let header = packet.append_header(HeaderKind::Udp, udp_bytes, datagram_bytes)?;
            UdpHeader::new(
                self.udp_src_port,
                self.udp_dst_port,
                layout.tcp_segment_bytes(),
            )?
            .write_to(header)?;
        }

        let header = packet.append_header(
            HeaderKind::Tcp,
            layout.tcp_header_bytes,
            layout.tcp_segment_bytes(),
        )?;
        TcpHeader {
            source_port: 0,
            destination_port: 0,
            sequence_number: self.start_sequence,
            acknowledgment_number: self.ack_sequence,
            data_offset: layout.data_offset_words(),
            flags: tcp_flags,
            window_size: self.window.wire_value(),
            checksum: 0,
            urgent_pointer: 0,
            options: self
                .tcp_options
                .as_ref()
                .map(|options| options.as_bytes().to_vec())
                .unwrap_or_default(),
        }
        .write_to(header)?;

        packet.insert_hints(self.hints());
        let packet = packet.finish();
        debug!(
            direction = %self.direction,
            flags = %self.flags,
            seq = self.start_sequence,
            bytes = packet.ip_bytes(),
            hints = ?packet.hints(),
            "built TCP packet"
        );
        Ok(packet)
    }
}

/// Build a TCP packet from its symbolic description.
///
/// `window` is the raw script value, `-1` meaning unspecified. Supplying
/// `None` for the options marks them as not compared; an empty option list
/// is compared and must be absent.
#[allow(clippy::too_many_arguments)]
pub fn new_tcp_packet(
    config: &BuilderConfig,
    family: AddressFamily,
    direction: Direction,
    ecn: IpEcn,
    flags: &str,
    start_sequence: u32,
    tcp_payload_bytes: u16,
    ack_sequence: u32,
    window: i64,
    tcp_options: Option<&TcpOptions>,
    ignore_ts_val: bool,
    abs_ts_ecr: bool,
    abs_seq: bool,
    ignore_seq: bool,
    udp_src_port: u16,
    udp_dst_port: u16,
) -> Result<Packet> {
    TcpSegmentSpec {
        family,
        direction,
        ecn,
        flags: flags.to_string(),
        start_sequence,
        tcp_payload_bytes,
        ack_sequence,
        window: Window::from_raw(window)?,
        tcp_options: tcp_options.cloned(),
        ignore_ts_val,
        abs_ts_ecr,
        abs_seq,
        ignore_seq,
        udp_src_port,
        udp_dst_port,
    }
    .build(config)
}

/// Packet builder with fluent API for TCP packets
///
/// # Examples
///
/// ```
/// use segdrill_core::{AddressFamily, Direction, PacketHints};
/// use segdrill_packet::TcpPacketBuilder;
///
/// let packet = TcpPacketBuilder::new(AddressFamily::Inet, Direction::Outbound)
///     .flags("S")
///     .seq(0)
///     .window_unspecified()
///     .build()
///     .unwrap();
///
/// assert_eq!(packet.len(), 40);
/// assert!(packet.has_hint(PacketHints::WINDOW_UNCHECKED));
/// ```
#[derive(Debug, Clone)]
pub struct TcpPacketBuilder {
    config: BuilderConfig,
    spec: TcpSegmentSpec,
}

impl TcpPacketBuilder {
    /// Create a new builder with the default configuration
    pub fn new(family: AddressFamily, direction: Direction) -> Self {
        TcpPacketBuilder {
            config: BuilderConfig::default(),
            spec: TcpSegmentSpec::new(family, direction),
        }
    }

    pub fn config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the ECN codepoint of the IP header
    pub fn ecn(mut self, ecn: IpEcn) -> Self {
        self.spec.ecn = ecn;
        self
    }

    /// Set the flag spec, e.g. `"S."` or `"P.2"`
    pub fn flags(mut self, flags: &str) -> Self {
        self.spec.flags = flags.to_string();
        self
    }

    /// Set the sequence number
    pub fn seq(mut self, seq: u32) -> Self {
        self.spec.start_sequence = seq;
        self
    }

    /// Set the acknowledgment number
    pub fn ack(mut self, ack: u32) -> Self {
        self.spec.ack_sequence = ack;
        self
    }

    /// Set the TCP window
    pub fn window(mut self, window: u16) -> Self {
        self.spec.window = Window::Value(window);
        self
    }

    /// Leave the window unspecified (outbound packets only)
    pub fn window_unspecified(mut self) -> Self {
        self.spec.window = Window::Unspecified;
        self
    }

    /// Set the payload length; payload bytes are left zero
    pub fn payload_len(mut self, bytes: u16) -> Self {
        self.spec.tcp_payload_bytes = bytes;
        self
    }

    /// Set the TCP options to emit and compare
    pub fn options(mut self, options: TcpOptions) -> Self {
        self.spec.tcp_options = Some(options);
        self
    }

    pub fn ignore_ts_val(mut self, on: bool) -> Self {
        self.spec.ignore_ts_val = on;
        self
    }

    pub fn abs_ts_ecr(mut self, on: bool) -> Self {
        self.spec.abs_ts_ecr = on;
        self
    }

    pub fn abs_seq(mut self, on: bool) -> Self {
        self.spec.abs_seq = on;
        self
    }

    pub fn ignore_seq(mut self, on: bool) -> Self {
        self.spec.ignore_seq = on;
        self
    }

    /// Tunnel the segment in UDP between the given ports
    pub fn udp_encapsulation(mut self, src_port: u16, dst_port: u16) -> Self {
        self.spec.udp_src_port = src_port;
        self.spec.udp_dst_port = dst_port;
        self
    }

    /// The description built so far
    pub fn spec(&self) -> &TcpSegmentSpec {
        &self.spec
    }

    /// Build the complete packet
    ///
    /// # Errors
    ///
    /// Returns an error if the flag spec is invalid for the configured
    /// grammar, the headers break an alignment or size limit, or an inbound
    /// packet leaves the window unspecified.
    pub fn build(&self) -> Result<Packet> {
        self.spec.build(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::{TcpFlags, TcpOptionsBuilder};
    use segdrill_core::FlagGrammar;

    fn outbound() -> TcpPacketBuilder {
        TcpPacketBuilder::new(AddressFamily::Inet, Direction::Outbound)
    }

    #[test]
    fn test_ack_segment_bytes() {
        let packet = outbound().flags(".").seq(1).window(100).build().unwrap();
        let data = packet.data();

        assert_eq!(data.len(), 40);
        assert_eq!(data[9], 6); // IP protocol TCP
        assert_eq!(&data[20..24], &[0, 0, 0, 0]); // ports left for binding
        assert_eq!(&data[24..28], &[0, 0, 0, 1]);
        assert_eq!(data[32] >> 4, 5);
        assert_eq!(data[33], TcpFlags::ACK.to_u8());
        assert_eq!(&data[34..36], &[0, 100]);
        assert!(packet.has_hint(PacketHints::OPTIONS_UNCHECKED));
        assert!(!packet.has_hint(PacketHints::WINDOW_UNCHECKED));
    }

    #[test]
    fn test_validation_precedes_layout() {
        let err = outbound()
            .flags("SX")
            .options(TcpOptions::new(vec![1, 1, 1]))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidFlag('X'));
    }

    #[test]
    fn test_inbound_requires_window() {
        let err = TcpPacketBuilder::new(AddressFamily::Inet6, Direction::Inbound)
            .flags("S.")
            .build()
            .unwrap_err();
        assert_eq!(err, Error::WindowRequired);
        assert_eq!(
            err.to_string(),
            "window must be specified for inbound packets"
        );

        let packet = TcpPacketBuilder::new(AddressFamily::Inet6, Direction::Inbound)
            .flags("S.")
            .window(0)
            .build()
            .unwrap();
        assert!(!packet.has_hint(PacketHints::WINDOW_UNCHECKED));
    }

    #[test]
    fn test_options_copied_after_fixed_header() {
        let options = TcpOptionsBuilder::new()
            .mss(1460)
            .nop()
            .window_scale(7)
            .build()
            .unwrap();
        let packet = outbound()
            .flags("S")
            .window(65535)
            .options(options.clone())
            .build()
            .unwrap();

        let tcp = packet.tcp_header().unwrap();
        assert_eq!(tcp.len(), 28);
        assert_eq!(tcp[12] >> 4, 7);
        assert_eq!(&tcp[20..], options.as_bytes());
        assert!(!packet.has_hint(PacketHints::OPTIONS_UNCHECKED));
    }

    #[test]
    fn test_empty_options_are_compared() {
        let packet = outbound()
            .flags("S")
            .window(1000)
            .options(TcpOptions::empty())
            .build()
            .unwrap();
        assert_eq!(packet.len(), 40);
        assert!(packet.hints().is_empty());
    }

    #[test]
    fn test_auxiliary_hints() {
        let packet = outbound()
            .flags(".")
            .window(10)
            .ignore_ts_val(true)
            .abs_ts_ecr(true)
            .abs_seq(true)
            .ignore_seq(true)
            .build()
            .unwrap();
        assert!(packet.has_hint(
            PacketHints::IGNORE_TS_VAL
                | PacketHints::ABSOLUTE_TS_ECR
                | PacketHints::ABSOLUTE_SEQ
                | PacketHints::IGNORE_SEQ
        ));

        let plain = outbound().flags(".").window(10).build().unwrap();
        assert!(!plain.has_hint(PacketHints::IGNORE_SEQ));
        assert_eq!(plain.data(), packet.data());
    }

    #[test]
    fn test_ecn_tag_and_ip_bits() {
        let packet = outbound()
            .flags("S")
            .window(1)
            .ecn(IpEcn::Ect01)
            .build()
            .unwrap();
        assert_eq!(packet.ecn(), IpEcn::Ect01);
        assert_eq!(packet.data()[1] & 0x3, 0b10);
    }

    #[test]
    fn test_grammar_from_config() {
        let permissive = BuilderConfig::new().with_grammar(FlagGrammar::PermissiveShorthand);
        let packet = outbound()
            .config(permissive)
            .flags("S.E2")
            .window(1)
            .build()
            .unwrap();
        let flags = TcpFlags::from_header(packet.tcp_header().unwrap()).unwrap();
        assert!(flags.ece && flags.cwr && !flags.ae);

        let err = outbound().flags("S.E2").window(1).build().unwrap_err();
        assert_eq!(err, Error::ConflictingFlag('2'));
    }

    #[test]
    fn test_new_tcp_packet_raw_window() {
        let config = BuilderConfig::default();
        let packet = new_tcp_packet(
            &config,
            AddressFamily::Inet,
            Direction::Outbound,
            IpEcn::None,
            "S",
            0,
            0,
            0,
            -1,
            None,
            false,
            false,
            false,
            false,
            0,
            0,
        )
        .unwrap();
        assert!(packet.has_hint(PacketHints::WINDOW_UNCHECKED | PacketHints::OPTIONS_UNCHECKED));

        let err = new_tcp_packet(
            &config,
            AddressFamily::Inet,
            Direction::Outbound,
            IpEcn::None,
            "S",
            0,
            0,
            0,
            70000,
            None,
            false,
            false,
            false,
            false,
            0,
            0,
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidWindow(70000));
    }

    #[test]
    fn test_single_udp_port_encapsulates() {
        let packet = outbound()
            .flags(".")
            .window(1)
            .udp_encapsulation(0, 9)
            .build()
            .unwrap();
        assert!(packet.has_hint(PacketHints::UDP_ENCAPSULATED));
        assert_eq!(packet.len(), 48);
        assert_eq!(packet.data()[9], 17);
    }
}
