//! TCP header construction and parsing
//!
//! This module provides the TCP flag set, the fixed header writer, and the
//! option blob that rides between the fixed header and the payload.

use crate::wire::{tcp, FieldReader, FieldWriter};
use bytes::{BufMut, Bytes, BytesMut};
use segdrill_core::{Error, Result};

/// Fixed TCP header size (without options)
pub const TCP_HEADER_BYTES: usize = 20;

/// Largest option area the data offset allows
pub const MAX_TCP_OPTION_BYTES: usize = 40;

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// FIN - No more data from sender
    pub fin: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// PSH - Push function
    pub psh: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
    /// AE - Accurate ECN (NS in older specs)
    pub ae: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags {
        fin: false,
        syn: false,
        rst: false,
        psh: false,
        ack: false,
        urg: false,
        ece: false,
        cwr: false,
        ae: false,
    };

    /// SYN flag (connection initiation)
    pub const SYN: TcpFlags = TcpFlags {
        syn: true,
        ..TcpFlags::NONE
    };

    /// ACK flag
    pub const ACK: TcpFlags = TcpFlags {
        ack: true,
        ..TcpFlags::NONE
    };

    pub fn new() -> Self {
        TcpFlags::NONE
    }

    /// Three-bit ACE counter carried by AE, CWR and ECE
    pub fn ace(&self) -> u8 {
        (u8::from(self.ae) << 2) | (u8::from(self.cwr) << 1) | u8::from(self.ece)
    }

    /// Set AE, CWR and ECE from a three-bit ACE value
    pub fn set_ace(&mut self, ace: u8) {
        self.ece = ace & 0b001 != 0;
        self.cwr = ace & 0b010 != 0;
        self.ae = ace & 0b100 != 0;
    }

    /// Convert the eight flags of header byte 13 to a u8 value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.fin {
            flags |= 0b00000001;
        }
        if self.syn {
            flags |= 0b00000010;
        }
        if self.rst {
            flags |= 0b00000100;
        }
        if self.psh {
            flags |= 0b00001000;
        }
        if self.ack {
            flags |= 0b00010000;
        }
        if self.urg {
            flags |= 0b00100000;
        }
        if self.ece {
            flags |= 0b01000000;
        }
        if self.cwr {
            flags |= 0b10000000;
        }
        flags
    }

    fn write(&self, writer: &mut FieldWriter<'_>) -> Result<()> {
        writer
            .set_bit(&tcp::FIN, self.fin)?
            .set_bit(&tcp::SYN, self.syn)?
            .set_bit(&tcp::RST, self.rst)?
            .set_bit(&tcp::PSH, self.psh)?
            .set_bit(&tcp::ACK, self.ack)?
            .set_bit(&tcp::URG, self.urg)?
            .set_bit(&tcp::ECE, self.ece)?
            .set_bit(&tcp::CWR, self.cwr)?
            .set_bit(&tcp::AE, self.ae)?;
        Ok(())
    }

    fn read(reader: &FieldReader<'_>) -> Self {
        TcpFlags {
            fin: reader.get_bit(&tcp::FIN),
            syn: reader.get_bit(&tcp::SYN),
            rst: reader.get_bit(&tcp::RST),
            psh: reader.get_bit(&tcp::PSH),
            ack: reader.get_bit(&tcp::ACK),
            urg: reader.get_bit(&tcp::URG),
            ece: reader.get_bit(&tcp::ECE),
            cwr: reader.get_bit(&tcp::CWR),
            ae: reader.get_bit(&tcp::AE),
        }
    }

    /// Read the flags back out of a written TCP header
    pub fn from_header(header: &[u8]) -> Option<Self> {
        FieldReader::new(&tcp::HEADER_V1, header)
            .ok()
            .map(|reader| TcpFlags::read(&reader))
    }
}

/// Raw TCP option bytes as supplied by the caller.
///
/// Cloning is cheap and clones share the same bytes, so one blob can be
/// handed to builders on several threads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TcpOptions {
    data: Bytes,
}

impl TcpOptions {
    pub fn new(data: impl Into<Bytes>) -> Self {
        TcpOptions { data: data.into() }
    }

    /// An explicitly empty option list (options are compared, and absent)
    pub fn empty() -> Self {
        TcpOptions::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// TCP option kinds the encoder knows about
pub mod option_kind {
    pub const EOL: u8 = 0;
    pub const NOP: u8 = 1;
    pub const MSS: u8 = 2;
    pub const WINDOW_SCALE: u8 = 3;
    pub const SACK_PERMITTED: u8 = 4;
    pub const TIMESTAMP: u8 = 8;
}

/// Encoder for TCP option lists.
///
/// Options are emitted in call order without padding: an odd-sized list is
/// left for the layout check to reject, the same as a hand-written blob.
#[derive(Debug, Default)]
pub struct TcpOptionsBuilder {
    buffer: BytesMut,
}

impl TcpOptionsBuilder {
    pub fn new() -> Self {
        TcpOptionsBuilder {
            buffer: BytesMut::with_capacity(MAX_TCP_OPTION_BYTES),
        }
    }

    /// End of option list
    pub fn eol(mut self) -> Self {
        self.buffer.put_u8(option_kind::EOL);
        self
    }

    /// No-operation (padding between options)
    pub fn nop(mut self) -> Self {
        self.buffer.put_u8(option_kind::NOP);
        self
    }

    /// Maximum segment size
    pub fn mss(mut self, mss: u16) -> Self {
        self.buffer.put_u8(option_kind::MSS);
        self.buffer.put_u8(4);
        self.buffer.put_u16(mss);
        self
    }

    /// Window scale shift count
    pub fn window_scale(mut self, shift: u8) -> Self {
        self.buffer.put_u8(option_kind::WINDOW_SCALE);
        self.buffer.put_u8(3);
        self.buffer.put_u8(shift);
        self
    }

    pub fn sack_permitted(mut self) -> Self {
        self.buffer.put_u8(option_kind::SACK_PERMITTED);
        self.buffer.put_u8(2);
        self
    }

    /// Timestamp option with TSval and TSecr
    pub fn timestamp(mut self, val: u32, ecr: u32) -> Self {
        self.buffer.put_u8(option_kind::TIMESTAMP);
        self.buffer.put_u8(10);
        self.buffer.put_u32(val);
        self.buffer.put_u32(ecr);
        self
    }

    /// Arbitrary pre-encoded option bytes
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buffer.put_slice(bytes);
        self
    }

    pub fn build(self) -> Result<TcpOptions> {
        if self.buffer.len() > MAX_TCP_OPTION_BYTES {
            return Err(Error::OptionOverflow {
                bytes: self.buffer.len(),
                max: MAX_TCP_OPTION_BYTES,
            });
        }
        Ok(TcpOptions::new(self.buffer.freeze()))
    }
}

/// TCP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Sequence number
    pub sequence_number: u32,
    /// Acknowledgment number
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words (minimum 5)
    pub data_offset: u8,
    /// TCP flags
    pub flags: TcpFlags,
    /// Window size
    pub window_size: u16,
    /// Checksum
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_pointer: u16,
    /// Options (if data_offset > 5)
    pub options: Vec<u8>,
}

impl TcpHeader {
    /// Write the header into `buf`, which spans the fixed part and the
    /// option area announced by `data_offset`.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.header_len() {
            return Err(Error::construction(format!(
                "TCP header region is {} bytes but data offset says {}",
                buf.len(),
                self.header_len()
            )));
        }
        let mut writer = FieldWriter::new(&tcp::HEADER_V1, buf)?;
        writer
            .set(&tcp::SRC_PORT, self.source_port.into())?
            .set(&tcp::DST_PORT, self.destination_port.into())?
            .set(&tcp::SEQ, self.sequence_number.into())?
            .set(&tcp::ACK_SEQ, self.acknowledgment_number.into())?
            .set(&tcp::DATA_OFFSET, self.data_offset.into())?
            .set(&tcp::RESERVED, 0)?
            .set(&tcp::WINDOW, self.window_size.into())?
            .set(&tcp::CHECKSUM, self.checksum.into())?
            .set(&tcp::URG_PTR, self.urgent_pointer.into())?;
        self.flags.write(&mut writer)?;

        let option_area = writer.options_mut();
        if self.options.len() > option_area.len() {
            return Err(Error::construction(format!(
                "{} option bytes do not fit a {}-byte option area",
                self.options.len(),
                option_area.len()
            )));
        }
        option_area[..self.options.len()].copy_from_slice(&self.options);
        Ok(())
    }

    /// Parse a TCP header from bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let reader = FieldReader::new(&tcp::HEADER_V1, data).ok()?;
        let data_offset = reader.get(&tcp::DATA_OFFSET) as u8;
        let header_len = (data_offset as usize) * 4;
        if header_len < TCP_HEADER_BYTES || data.len() < header_len {
            return None;
        }

        Some(TcpHeader {
            source_port: reader.get(&tcp::SRC_PORT) as u16,
            destination_port: reader.get(&tcp::DST_PORT) as u16,
            sequence_number: reader.get(&tcp::SEQ) as u32,
            acknowledgment_number: reader.get(&tcp::ACK_SEQ) as u32,
            data_offset,
            flags: TcpFlags::read(&reader),
            window_size: reader.get(&tcp::WINDOW) as u16,
            checksum: reader.get(&tcp::CHECKSUM) as u16,
            urgent_pointer: reader.get(&tcp::URG_PTR) as u16,
            options: data[TCP_HEADER_BYTES..header_len].to_vec(),
        })
    }

    /// Get the header size in bytes
    pub fn header_len(&self) -> usize {
        (self.data_offset as usize) * 4
    }
}
