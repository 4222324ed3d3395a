//! End-to-end segment construction scenarios

use segdrill_core::{
    AddressFamily, BuilderConfig, Direction, Error, FlagGrammar, HeaderKind, IpEcn, PacketHints,
    MAX_TCP_HEADER_BYTES,
};
use segdrill_packet::{
    new_tcp_packet, TcpFlags, TcpHeader, TcpOptions, TcpPacketBuilder, UdpHeader,
};

fn outbound(family: AddressFamily) -> TcpPacketBuilder {
    TcpPacketBuilder::new(family, Direction::Outbound)
}

#[test]
fn test_pure_ack_ipv4() {
    let packet = outbound(AddressFamily::Inet)
        .flags(".")
        .seq(1)
        .window(100)
        .build()
        .unwrap();

    assert_eq!(packet.len(), 20 + 20);
    let header = TcpHeader::from_bytes(packet.tcp_header().unwrap()).unwrap();
    assert_eq!(
        header.flags,
        TcpFlags {
            ack: true,
            ..TcpFlags::NONE
        }
    );
    assert_eq!(header.sequence_number, 1);
    assert_eq!(&packet.data()[24..28], &[0x00, 0x00, 0x00, 0x01]);
    assert_eq!(header.window_size, 100);
    assert!(packet.udp_header().is_none());
}

#[test]
fn test_syn_with_unspecified_window() {
    let packet = outbound(AddressFamily::Inet)
        .flags("S")
        .window_unspecified()
        .build()
        .unwrap();

    let tcp = packet.tcp_header().unwrap();
    assert_eq!(&tcp[14..16], &[0x00, 0x00]);
    assert!(packet.has_hint(PacketHints::WINDOW_UNCHECKED));
    assert!(TcpFlags::from_header(tcp).unwrap().syn);
}

#[test]
fn test_unspecified_window_inbound_fails() {
    for family in [AddressFamily::Inet, AddressFamily::Inet6] {
        for flags in ["S", "S.", ".", "F.", "R"] {
            let result = TcpPacketBuilder::new(family, Direction::Inbound)
                .flags(flags)
                .window_unspecified()
                .build();
            assert_eq!(result, Err(Error::WindowRequired));
        }
    }
}

#[test]
fn test_udp_encapsulation() {
    let payload = 10;
    let packet = outbound(AddressFamily::Inet)
        .flags(".")
        .window(1)
        .payload_len(payload)
        .udp_encapsulation(5000, 6000)
        .build()
        .unwrap();

    let data = packet.data();
    assert_eq!(data.len(), 20 + 8 + 20 + payload as usize);
    assert_eq!(data[9], 17);
    assert_eq!(&data[20..22], &5000u16.to_be_bytes());
    assert_eq!(&data[22..24], &6000u16.to_be_bytes());

    let udp = UdpHeader::from_bytes(packet.udp_header().unwrap()).unwrap();
    assert_eq!(udp.len(), 8 + 20 + payload as usize);
    assert_eq!(udp.checksum, 0);

    let tcp_region = packet.header(HeaderKind::Tcp).unwrap();
    assert_eq!(tcp_region.offset, 28);
    assert!(packet.has_hint(PacketHints::UDP_ENCAPSULATED));
}

#[test]
fn test_data_offset_matches_header_length() {
    for words in 0..=10usize {
        let options = TcpOptions::new(vec![1u8; words * 4]);
        for family in [AddressFamily::Inet, AddressFamily::Inet6] {
            for udp in [false, true] {
                let mut builder = outbound(family)
                    .flags("P.")
                    .window(512)
                    .payload_len(33)
                    .options(options.clone());
                if udp {
                    builder = builder.udp_encapsulation(1, 2);
                }
                let packet = builder.build().unwrap();

                let tcp = packet.header(HeaderKind::Tcp).unwrap();
                let header = TcpHeader::from_bytes(packet.tcp_header().unwrap()).unwrap();
                assert_eq!(header.data_offset as usize * 4, tcp.header_bytes);
                assert_eq!(tcp.header_bytes, 20 + words * 4);

                let udp_bytes = if udp { 8 } else { 0 };
                assert_eq!(
                    packet.len(),
                    family.ip_header_min_len() + udp_bytes + tcp.header_bytes + 33
                );
                assert_eq!(packet.ip_bytes(), packet.len());
            }
        }
    }
}

#[test]
fn test_header_ceiling_through_builder() {
    let at_max = TcpOptions::new(vec![1u8; MAX_TCP_HEADER_BYTES - 20]);
    assert!(outbound(AddressFamily::Inet)
        .flags("S")
        .options(at_max)
        .build()
        .is_ok());

    let over = TcpOptions::new(vec![1u8; MAX_TCP_HEADER_BYTES - 16]);
    let err = outbound(AddressFamily::Inet)
        .flags("S")
        .options(over)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::HeaderTooLarge { .. }));
}

#[test]
fn test_datagram_ceiling_through_builder() {
    let packet = outbound(AddressFamily::Inet)
        .flags(".")
        .window(1)
        .payload_len(65495)
        .build()
        .unwrap();
    assert_eq!(packet.len(), 65535);
    assert_eq!(&packet.data()[2..4], &[0xFF, 0xFF]);

    let err = outbound(AddressFamily::Inet)
        .flags(".")
        .window(1)
        .payload_len(65496)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        Error::DatagramTooLarge {
            bytes: 65536,
            max: 65535
        }
    );

    let packet = outbound(AddressFamily::Inet6)
        .flags(".")
        .window(1)
        .payload_len(65476)
        .build()
        .unwrap();
    assert_eq!(packet.len(), 65536);
    assert_eq!(&packet.data()[4..6], &[0xFF, 0xD8]);
}

#[test]
fn test_unaligned_options_through_builder() {
    for len in [1usize, 2, 3, 5, 6, 7, 9, 13, 18, 23] {
        let err = outbound(AddressFamily::Inet6)
            .flags("S")
            .options(TcpOptions::new(vec![1u8; len]))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnalignedOptions {
                header: HeaderKind::Tcp,
                excess: len % 4
            }
        );
    }
}

#[test]
fn test_strict_ace_digit_in_header() {
    let packet = outbound(AddressFamily::Inet)
        .flags(".5")
        .window(1)
        .build()
        .unwrap();
    let tcp = packet.tcp_header().unwrap();
    let flags = TcpFlags::from_header(tcp).unwrap();
    assert!(flags.ack);
    assert!(flags.ece);
    assert!(!flags.cwr);
    assert!(flags.ae);
    assert_eq!(tcp[12] & 0x01, 0x01);
    assert_eq!(tcp[13], 0x50);
}

#[test]
fn test_grammars_disagree_on_mixed_spec() {
    let strict = BuilderConfig::default();
    let permissive = BuilderConfig::new().with_grammar(FlagGrammar::PermissiveShorthand);

    let build = |config: &BuilderConfig, flags: &str| {
        new_tcp_packet(
            config,
            AddressFamily::Inet,
            Direction::Outbound,
            IpEcn::Ect0,
            flags,
            100,
            0,
            0,
            -1,
            Some(&TcpOptions::empty()),
            false,
            false,
            false,
            false,
            0,
            0,
        )
    };

    assert_eq!(build(&strict, "S.W1"), Err(Error::ConflictingFlag('1')));
    let packet = build(&permissive, "S.W1").unwrap();
    let flags = TcpFlags::from_header(packet.tcp_header().unwrap()).unwrap();
    assert_eq!(flags.ace(), 0b011);

    assert_eq!(build(&permissive, "S.A"), Err(Error::InvalidFlag('A')));
}

#[test]
fn test_shared_options_across_threads() {
    let options = TcpOptions::new(vec![2, 4, 5, 0xB4]);
    let handles: Vec<_> = (0..4u32)
        .map(|seq| {
            let options = options.clone();
            std::thread::spawn(move || {
                outbound(AddressFamily::Inet)
                    .flags("S")
                    .seq(seq)
                    .window(1000)
                    .options(options)
                    .build()
            })
        })
        .collect();

    for (seq, handle) in handles.into_iter().enumerate() {
        let packet = handle.join().unwrap().unwrap();
        let header = TcpHeader::from_bytes(packet.tcp_header().unwrap()).unwrap();
        assert_eq!(header.sequence_number, seq as u32);
        assert_eq!(header.options, vec![2, 4, 5, 0xB4]);
    }
}
