//! segdrill core library
//!
//! This crate provides the error type, shared enums, builder configuration
//! and the packet container used by the segdrill segment builder.

pub mod config;
pub mod error;
pub mod packet;
pub mod types;

// Re-export commonly used types
pub use config::{BuilderConfig, FlagGrammar, MAX_TCP_DATAGRAM_BYTES, MAX_TCP_HEADER_BYTES};
pub use error::{Error, Result};
pub use packet::{HeaderRegion, Packet, PacketBuf, PacketHints};
pub use types::*;
