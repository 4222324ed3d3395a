//! CLI argument parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use segdrill_core::{AddressFamily, BuilderConfig, Direction, FlagGrammar, IpEcn};

#[derive(Parser, Debug)]
#[command(name = "segdrill")]
#[command(version, about = "Build TCP test packets from symbolic descriptions", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Flag grammar used to read flag specs
    #[arg(short = 'g', long, value_enum, default_value_t = GrammarArg::Strict, global = true)]
    pub grammar: GrammarArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a TCP packet and print it as hex
    Build(BuildArgs),

    /// Only validate a flag spec
    CheckFlags {
        /// Flag characters, e.g. "S." or ".2"
        #[arg(value_name = "FLAGS", allow_hyphen_values = true)]
        flags: String,
    },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Flag characters, e.g. "S." or ".2"
    #[arg(short, long)]
    pub flags: String,

    /// Address family of the IP header
    #[arg(long, value_enum, default_value_t = FamilyArg::Ipv4)]
    pub family: FamilyArg,

    /// Packet is expected from the stack under test
    #[arg(long)]
    pub inbound: bool,

    /// ECN codepoint of the IP header
    #[arg(long, value_enum, default_value_t = EcnArg::None)]
    pub ecn: EcnArg,

    /// Sequence number
    #[arg(short, long, default_value = "0")]
    pub seq: u32,

    /// Acknowledgment number
    #[arg(short, long, default_value = "0")]
    pub ack: u32,

    /// Receive window, -1 for unspecified
    #[arg(short, long, default_value = "-1", allow_negative_numbers = true)]
    pub window: i64,

    /// Payload length in bytes
    #[arg(short, long, default_value = "0")]
    pub payload: u16,

    /// Raw TCP option bytes as hex; omit to leave options unchecked
    #[arg(short, long, value_name = "HEX")]
    pub options: Option<String>,

    /// Tunnel in UDP from this source port
    #[arg(long, default_value = "0")]
    pub udp_src: u16,

    /// Tunnel in UDP to this destination port
    #[arg(long, default_value = "0")]
    pub udp_dst: u16,

    /// Ignore the timestamp value when comparing
    #[arg(long)]
    pub ignore_ts_val: bool,

    /// Treat the timestamp echo reply as absolute
    #[arg(long)]
    pub abs_ts_ecr: bool,

    /// Treat the sequence number as absolute
    #[arg(long)]
    pub abs_seq: bool,

    /// Ignore the sequence number when comparing
    #[arg(long)]
    pub ignore_seq: bool,

    /// Lower the TCP header ceiling (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_tcp_header: Option<usize>,

    /// Lower the datagram ceiling (bytes, capped at 65536)
    #[arg(long, value_name = "BYTES")]
    pub max_datagram: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarArg {
    /// Single ACE digit, exclusive with E/W/A
    Strict,
    /// Digits OR-ed with E/W/N
    Permissive,
}

impl From<GrammarArg> for FlagGrammar {
    fn from(arg: GrammarArg) -> Self {
        match arg {
            GrammarArg::Strict => FlagGrammar::StrictAce,
            GrammarArg::Permissive => FlagGrammar::PermissiveShorthand,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    Ipv4,
    Ipv6,
}

impl From<FamilyArg> for AddressFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Ipv4 => AddressFamily::Inet,
            FamilyArg::Ipv6 => AddressFamily::Inet6,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcnArg {
    None,
    Ect0,
    Ect1,
    Ce,
    Ect01,
}

impl From<EcnArg> for IpEcn {
    fn from(arg: EcnArg) -> Self {
        match arg {
            EcnArg::None => IpEcn::None,
            EcnArg::Ect0 => IpEcn::Ect0,
            EcnArg::Ect1 => IpEcn::Ect1,
            EcnArg::Ce => IpEcn::Ce,
            EcnArg::Ect01 => IpEcn::Ect01,
        }
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Builder configuration selected by the global options
    pub fn config(&self) -> BuilderConfig {
        let mut config = BuilderConfig::new().with_grammar(self.grammar.into());
        if let Commands::Build(args) = &self.command {
            if let Some(bytes) = args.max_tcp_header {
                config = config.with_max_tcp_header_bytes(bytes);
            }
            if let Some(bytes) = args.max_datagram {
                config = config.with_max_datagram_bytes(bytes);
            }
        }
        config
    }
}

impl BuildArgs {
    pub fn direction(&self) -> Direction {
        if self.inbound {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }
}
