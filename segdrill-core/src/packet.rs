//! Packet container
//!
//! A [`PacketBuf`] is the mutable draft a builder writes headers into; once
//! every header is in place it is frozen into an immutable [`Packet`] that
//! downstream stages (port binding, checksumming, comparison) only read.

use bitflags::bitflags;

use crate::types::{Direction, HeaderKind, IpEcn};
use crate::{Error, Result};

bitflags! {
    /// Comparison hints attached to a packet.
    ///
    /// They are not part of the wire bytes; they tell the comparison stage
    /// which fields to check loosely or interpret differently.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketHints: u32 {
        /// TCP segment is carried inside a UDP datagram
        const UDP_ENCAPSULATED = 1 << 0;
        /// Window was not specified; do not compare it
        const WINDOW_UNCHECKED = 1 << 1;
        /// Options were not specified; do not compare them
        const OPTIONS_UNCHECKED = 1 << 2;
        /// Ignore the TSval of a timestamp option
        const IGNORE_TS_VAL = 1 << 3;
        /// TSecr is absolute, not relative to the peer's TSval
        const ABSOLUTE_TS_ECR = 1 << 4;
        /// Sequence number is absolute, not relative to the ISN
        const ABSOLUTE_SEQ = 1 << 5;
        /// Ignore the sequence number entirely
        const IGNORE_SEQ = 1 << 6;
    }
}

/// Location of one header inside a packet buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRegion {
    pub kind: HeaderKind,
    /// Byte offset of the header from the start of the buffer
    pub offset: usize,
    /// Length of the header itself
    pub header_bytes: usize,
    /// Length of the header plus everything it encloses
    pub total_bytes: usize,
}

impl HeaderRegion {
    /// Offset one past the end of the header
    pub fn end(&self) -> usize {
        self.offset + self.header_bytes
    }
}

/// Mutable packet under construction
#[derive(Debug)]
pub struct PacketBuf {
    buffer: Vec<u8>,
    direction: Direction,
    ecn: IpEcn,
    hints: PacketHints,
    headers: Vec<HeaderRegion>,
}

impl PacketBuf {
    /// Allocate a zero-filled buffer of `size` bytes
    pub fn new(size: usize, direction: Direction, ecn: IpEcn) -> Self {
        Self {
            buffer: vec![0; size],
            direction,
            ecn,
            hints: PacketHints::empty(),
            headers: Vec::new(),
        }
    }

    /// Reserve the next `header_bytes` bytes for a header of `kind`.
    ///
    /// Regions are laid out back to back in call order; `total_bytes`
    /// records how much of the buffer the header covers including payload.
    pub fn append_header(
        &mut self,
        kind: HeaderKind,
        header_bytes: usize,
        total_bytes: usize,
    ) -> Result<&mut [u8]> {
        let offset = self.headers.last().map_or(0, HeaderRegion::end);
        let end = offset + header_bytes;
        if end > self.buffer.len() || offset + total_bytes > self.buffer.len() {
            return Err(Error::construction(format!(
                "{} header of {} bytes at offset {} overruns {}-byte packet",
                kind,
                header_bytes,
                offset,
                self.buffer.len()
            )));
        }
        self.headers.push(HeaderRegion {
            kind,
            offset,
            header_bytes,
            total_bytes,
        });
        Ok(&mut self.buffer[offset..end])
    }

    /// Add comparison hints
    pub fn insert_hints(&mut self, hints: PacketHints) {
        self.hints.insert(hints);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Freeze the draft into an immutable packet
    pub fn finish(self) -> Packet {
        Packet {
            ip_bytes: self.buffer.len(),
            buffer: self.buffer,
            direction: self.direction,
            ecn: self.ecn,
            hints: self.hints,
            headers: self.headers,
        }
    }
}

/// A fully built packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    buffer: Vec<u8>,
    direction: Direction,
    ecn: IpEcn,
    hints: PacketHints,
    headers: Vec<HeaderRegion>,
    ip_bytes: usize,
}

impl Packet {
    /// Get packet data as slice
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Total IP datagram length in bytes
    pub fn ip_bytes(&self) -> usize {
        self.ip_bytes
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn ecn(&self) -> IpEcn {
        self.ecn
    }

    pub fn hints(&self) -> PacketHints {
        self.hints
    }

    /// Check whether every hint in `hints` is set
    pub fn has_hint(&self, hints: PacketHints) -> bool {
        self.hints.contains(hints)
    }

    /// Header regions in buffer order
    pub fn headers(&self) -> &[HeaderRegion] {
        &self.headers
    }

    /// First header region of the given kind
    pub fn header(&self, kind: HeaderKind) -> Option<&HeaderRegion> {
        self.headers.iter().find(|h| h.kind == kind)
    }

    /// Bytes of the first header of the given kind, options included
    pub fn header_bytes(&self, kind: HeaderKind) -> Option<&[u8]> {
        self.header(kind)
            .map(|region| &self.buffer[region.offset..region.end()])
    }

    pub fn ip_header(&self) -> Option<&[u8]> {
        self.header_bytes(HeaderKind::Ip)
    }

    pub fn udp_header(&self) -> Option<&[u8]> {
        self.header_bytes(HeaderKind::Udp)
    }

    pub fn tcp_header(&self) -> Option<&[u8]> {
        self.header_bytes(HeaderKind::Tcp)
    }

    /// Consume the packet, returning the raw buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}
