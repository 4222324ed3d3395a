//! Example: Building a SYN with options
//!
//! Builds the SYN a test script would inject to open a connection and
//! prints the resulting IPv4 packet.

use segdrill_core::{AddressFamily, Direction, PacketHints};
use segdrill_packet::{TcpFlags, TcpOptionsBuilder, TcpPacketBuilder};

fn main() {
    let options = TcpOptionsBuilder::new()
        .mss(1460)
        .sack_permitted()
        .timestamp(100, 0)
        .nop()
        .window_scale(7)
        .build()
        .expect("options fit in 40 bytes");

    let packet = TcpPacketBuilder::new(AddressFamily::Inet, Direction::Outbound)
        .flags("S")
        .seq(0)
        .window(32792)
        .options(options)
        .build()
        .expect("Failed to build TCP SYN packet");

    println!("TCP SYN packet built successfully!");
    println!("Total size: {} bytes", packet.len());
    for region in packet.headers() {
        println!(
            "  {} header at offset {} ({} bytes)",
            region.kind, region.offset, region.header_bytes
        );
    }

    let tcp = packet.tcp_header().expect("packet has a TCP header");
    let flags = TcpFlags::from_header(tcp).expect("header is complete");
    println!("TCP flags byte: 0x{:02X}", flags.to_u8());
    println!("  SYN flag set: {}", flags.syn);
    println!(
        "  options compared: {}",
        !packet.has_hint(PacketHints::OPTIONS_UNCHECKED)
    );
}
