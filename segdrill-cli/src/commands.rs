//! Command implementations
//!
//! Each command returns its report as a string so `main` only has to print.

use segdrill_core::{BuilderConfig, Error, FlagGrammar, Packet, PacketHints, Result};
use segdrill_packet::{flags, new_tcp_packet, TcpOptions};
use tracing::info;

use crate::args::{BuildArgs, Cli, Commands};

/// Run the command selected on the command line
pub fn run(cli: &Cli) -> Result<String> {
    let config = cli.config();
    match &cli.command {
        Commands::Build(args) => build(args, &config),
        Commands::CheckFlags { flags } => check_flags(flags, config.grammar),
    }
}

fn parse_options(hex_options: Option<&str>) -> Result<Option<TcpOptions>> {
    hex_options
        .map(|text| {
            hex::decode(text.trim())
                .map(TcpOptions::new)
                .map_err(|e| Error::invalid_parameter("options".to_string(), e.to_string()))
        })
        .transpose()
}

/// Build a packet and render it header by header
pub fn build(args: &BuildArgs, config: &BuilderConfig) -> Result<String> {
    let options = parse_options(args.options.as_deref())?;
    let packet = new_tcp_packet(
        config,
        args.family.into(),
        args.direction(),
        args.ecn.into(),
        &args.flags,
        args.seq,
        args.payload,
        args.ack,
        args.window,
        options.as_ref(),
        args.ignore_ts_val,
        args.abs_ts_ecr,
        args.abs_seq,
        args.ignore_seq,
        args.udp_src,
        args.udp_dst,
    )?;
    info!(bytes = packet.len(), direction = %packet.direction(), "packet built");
    Ok(render(&packet))
}

/// Validate a flag spec without building anything
pub fn check_flags(spec: &str, grammar: FlagGrammar) -> Result<String> {
    let decoded = flags::parse(spec, grammar)?;
    Ok(format!(
        "{:?} ok ({} grammar): flags=0x{:02x} ace={}",
        spec,
        grammar,
        decoded.to_u8(),
        decoded.ace()
    ))
}

/// Names of the hints set on `hints`, in bit order
pub fn hint_names(hints: PacketHints) -> Vec<&'static str> {
    hints.iter_names().map(|(name, _)| name).collect()
}

fn render(packet: &Packet) -> String {
    let mut lines = vec![format!(
        "{} bytes, {}, ecn {:?}",
        packet.len(),
        packet.direction(),
        packet.ecn()
    )];
    let mut end = 0;
    for region in packet.headers() {
        let bytes = &packet.data()[region.offset..region.end()];
        lines.push(format!("{:<4} {}", region.kind.to_string(), hex::encode(bytes)));
        end = region.end();
    }
    if end < packet.len() {
        lines.push(format!("data {}", hex::encode(&packet.data()[end..])));
    }
    let hints = hint_names(packet.hints());
    if hints.is_empty() {
        lines.push("hints: none".to_string());
    } else {
        lines.push(format!("hints: {}", hints.join(" ")));
    }
    lines.push(String::new());
    lines.join("\n")
}
