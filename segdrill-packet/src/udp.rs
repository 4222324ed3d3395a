//! UDP header construction and parsing
//!
//! Used when a TCP segment is tunnelled inside UDP. The checksum is left at
//! zero ("no checksum" for UDP over IPv4); a later stage recomputes it.

use crate::wire::{udp, FieldReader, FieldWriter};
use segdrill_core::{Error, Result};

/// UDP header size in bytes
pub const UDP_HEADER_BYTES: usize = 8;

/// UDP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Length (header + data)
    pub length: u16,
    /// Checksum
    pub checksum: u16,
}

impl UdpHeader {
    /// Header for a datagram carrying `payload_bytes`, checksum unset.
    ///
    /// Fails when the datagram does not fit the 16-bit length field.
    pub fn new(source_port: u16, destination_port: u16, payload_bytes: usize) -> Result<Self> {
        let bytes = UDP_HEADER_BYTES.saturating_add(payload_bytes);
        let length = u16::try_from(bytes).map_err(|_| Error::DatagramTooLarge {
            bytes,
            max: usize::from(u16::MAX),
        })?;
        Ok(UdpHeader {
            source_port,
            destination_port,
            length,
            checksum: 0,
        })
    }

    pub fn write_to(&self, buf: &mut [u8]) -> Result<()> {
        FieldWriter::new(&udp::HEADER_V1, buf)?
            .set(&udp::SRC_PORT, self.source_port.into())?
            .set(&udp::DST_PORT, self.destination_port.into())?
            .set(&udp::LENGTH, self.length.into())?
            .set(&udp::CHECKSUM, self.checksum.into())?;
        Ok(())
    }

    /// Parse a UDP header from bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let reader = FieldReader::new(&udp::HEADER_V1, data).ok()?;
        Some(UdpHeader {
            source_port: reader.get(&udp::SRC_PORT) as u16,
            destination_port: reader.get(&udp::DST_PORT) as u16,
            length: reader.get(&udp::LENGTH) as u16,
            checksum: reader.get(&udp::CHECKSUM) as u16,
        })
    }

    /// Get the total datagram size in bytes
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= UDP_HEADER_BYTES
    }
}
