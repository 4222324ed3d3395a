//! Error types for segdrill

use thiserror::Error;

use crate::types::HeaderKind;

/// Result type alias for segdrill operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning a symbolic segment description into bytes.
///
/// Every variant is a deterministic consequence of the input: callers
/// surface them to the user and abort the step rather than retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Character outside the active flag alphabet
    #[error("Invalid TCP flag: '{0}'")]
    InvalidFlag(char),

    /// Two encodings of the same ECN bits, or a second ACE digit
    #[error("Conflicting TCP flag: '{0}'")]
    ConflictingFlag(char),

    /// Option bytes that would leave a header off a 4-byte boundary
    #[error(
        "{header} options are not padded correctly to ensure {header} header \
         is a multiple of 4 bytes: {excess} excess bytes"
    )]
    UnalignedOptions { header: HeaderKind, excess: usize },

    /// TCP header (fixed part plus options) above the data offset ceiling
    #[error("TCP header too large: {bytes} bytes (max {max})")]
    HeaderTooLarge { bytes: usize, max: usize },

    /// Whole IP datagram above the datagram ceiling
    #[error("TCP segment too large: {bytes} bytes (max {max})")]
    DatagramTooLarge { bytes: usize, max: usize },

    /// Unspecified window on a packet the stack under test will send
    #[error("window must be specified for inbound packets")]
    WindowRequired,

    /// Raw window value that is neither the sentinel nor a 16-bit value
    #[error("Invalid TCP window: {0}")]
    InvalidWindow(i64),

    /// Encoded TCP options longer than the header can carry
    #[error("TCP options too long: {bytes} bytes (max {max})")]
    OptionOverflow { bytes: usize, max: usize },

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Header region requested past the end of the packet buffer
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),
}

impl Error {
    /// Create an unaligned-options error for the given header
    pub fn unaligned(header: HeaderKind, option_bytes: usize) -> Self {
        Error::UnalignedOptions {
            header,
            excess: option_bytes & 0x3,
        }
    }

    /// Create a packet construction error with a custom message
    pub fn construction<S: Into<String>>(msg: S) -> Self {
        Error::PacketConstruction(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error stems from the flag grammar rather than sizes
    pub fn is_flag_error(&self) -> bool {
        matches!(self, Error::InvalidFlag(_) | Error::ConflictingFlag(_))
    }
}
