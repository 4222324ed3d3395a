//! Builder configuration

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Largest TCP header the 4-bit data offset can express (15 words)
pub const MAX_TCP_HEADER_BYTES: usize = 15 * 4;

/// Largest IP datagram carrying a TCP segment
pub const MAX_TCP_DATAGRAM_BYTES: usize = 64 * 1024;

/// How digits in a flag spec relate to the ECN letters.
///
/// Two generations of the script language disagree here, so the choice is
/// made once per builder instead of being hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlagGrammar {
    /// `.FSRPEWA0-7`: a single digit is the whole 3-bit ACE field and may
    /// not be combined with `E`, `W` or `A`.
    #[default]
    StrictAce,
    /// `.FSRPEWN0-7`: digits are shorthand OR-ed into ECE/CWR/NS alongside
    /// the letters, any number of them.
    PermissiveShorthand,
}

impl fmt::Display for FlagGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagGrammar::StrictAce => write!(f, "strict"),
            FlagGrammar::PermissiveShorthand => write!(f, "permissive"),
        }
    }
}

impl FromStr for FlagGrammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "ace" => Ok(FlagGrammar::StrictAce),
            "permissive" | "shorthand" => Ok(FlagGrammar::PermissiveShorthand),
            other => Err(Error::invalid_parameter(
                "grammar".to_string(),
                format!("unknown flag grammar '{}'", other),
            )),
        }
    }
}

/// Configuration for segment construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Flag grammar used to read flag specs
    pub grammar: FlagGrammar,
    /// Ceiling on the TCP header, options included
    pub max_tcp_header_bytes: usize,
    /// Ceiling on the whole IP datagram
    pub max_datagram_bytes: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            grammar: FlagGrammar::default(),
            max_tcp_header_bytes: MAX_TCP_HEADER_BYTES,
            max_datagram_bytes: MAX_TCP_DATAGRAM_BYTES,
        }
    }
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grammar(mut self, grammar: FlagGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Lower the TCP header ceiling; values above the wire limit are clamped
    pub fn with_max_tcp_header_bytes(mut self, bytes: usize) -> Self {
        self.max_tcp_header_bytes = bytes.min(MAX_TCP_HEADER_BYTES);
        self
    }

    /// Lower the datagram ceiling; values above 64 KiB are clamped
    pub fn with_max_datagram_bytes(mut self, bytes: usize) -> Self {
        self.max_datagram_bytes = bytes.min(MAX_TCP_DATAGRAM_BYTES);
        self
    }
}
