//! Binary layout descriptions for the headers segdrill writes
//!
//! Each header format is a versioned table of fields, each field a bit
//! offset and bit width counted from the most significant bit of the first
//! header byte. Multi-bit fields are big-endian (network order). Header
//! writers never overlay structs on the buffer; they go through
//! [`FieldWriter`] with the field constants below.

use segdrill_core::{Error, Result};

/// One field of a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub bit_offset: usize,
    pub bit_width: usize,
}

impl Field {
    pub const fn new(name: &'static str, bit_offset: usize, bit_width: usize) -> Self {
        Field {
            name,
            bit_offset,
            bit_width,
        }
    }

    /// Largest value the field can hold
    pub fn max_value(&self) -> u128 {
        if self.bit_width >= 128 {
            u128::MAX
        } else {
            (1u128 << self.bit_width) - 1
        }
    }

    fn end_bit(&self) -> usize {
        self.bit_offset + self.bit_width
    }
}

/// Versioned description of a fixed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFormat {
    pub name: &'static str,
    pub version: u8,
    /// Length of the fixed part in bytes
    pub fixed_bytes: usize,
    pub fields: &'static [Field],
}

impl HeaderFormat {
    /// Look a field up by name
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// TCP header fields (RFC 9293, AE bit from RFC 9768)
pub mod tcp {
    use super::{Field, HeaderFormat};

    pub const SRC_PORT: Field = Field::new("src_port", 0, 16);
    pub const DST_PORT: Field = Field::new("dst_port", 16, 16);
    pub const SEQ: Field = Field::new("seq", 32, 32);
    pub const ACK_SEQ: Field = Field::new("ack_seq", 64, 32);
    pub const DATA_OFFSET: Field = Field::new("doff", 96, 4);
    pub const RESERVED: Field = Field::new("res1", 100, 3);
    /// Accurate ECN bit, historically NS
    pub const AE: Field = Field::new("ae", 103, 1);
    pub const CWR: Field = Field::new("cwr", 104, 1);
    pub const ECE: Field = Field::new("ece", 105, 1);
    pub const URG: Field = Field::new("urg", 106, 1);
    pub const ACK: Field = Field::new("ack", 107, 1);
    pub const PSH: Field = Field::new("psh", 108, 1);
    pub const RST: Field = Field::new("rst", 109, 1);
    pub const SYN: Field = Field::new("syn", 110, 1);
    pub const FIN: Field = Field::new("fin", 111, 1);
    pub const WINDOW: Field = Field::new("window", 112, 16);
    pub const CHECKSUM: Field = Field::new("check", 128, 16);
    pub const URG_PTR: Field = Field::new("urg_ptr", 144, 16);

    pub const HEADER_V1: HeaderFormat = HeaderFormat {
        name: "tcp",
        version: 1,
        fixed_bytes: 20,
        fields: &[
            SRC_PORT, DST_PORT, SEQ, ACK_SEQ, DATA_OFFSET, RESERVED, AE, CWR, ECE, URG, ACK,
            PSH, RST, SYN, FIN, WINDOW, CHECKSUM, URG_PTR,
        ],
    };
}

/// UDP header fields (RFC 768)
pub mod udp {
    use super::{Field, HeaderFormat};

    pub const SRC_PORT: Field = Field::new("src_port", 0, 16);
    pub const DST_PORT: Field = Field::new("dst_port", 16, 16);
    pub const LENGTH: Field = Field::new("len", 32, 16);
    pub const CHECKSUM: Field = Field::new("check", 48, 16);

    pub const HEADER_V1: HeaderFormat = HeaderFormat {
        name: "udp",
        version: 1,
        fixed_bytes: 8,
        fields: &[SRC_PORT, DST_PORT, LENGTH, CHECKSUM],
    };
}

/// IPv4 header fields (RFC 791, ECN split per RFC 3168)
pub mod ipv4 {
    use super::{Field, HeaderFormat};

    pub const VERSION: Field = Field::new("version", 0, 4);
    pub const IHL: Field = Field::new("ihl", 4, 4);
    pub const DSCP: Field = Field::new("dscp", 8, 6);
    pub const ECN: Field = Field::new("ecn", 14, 2);
    pub const TOTAL_LENGTH: Field = Field::new("tot_len", 16, 16);
    pub const IDENTIFICATION: Field = Field::new("id", 32, 16);
    pub const FLAGS: Field = Field::new("flags", 48, 3);
    pub const FRAGMENT_OFFSET: Field = Field::new("frag_off", 51, 13);
    pub const TTL: Field = Field::new("ttl", 64, 8);
    pub const PROTOCOL: Field = Field::new("protocol", 72, 8);
    pub const CHECKSUM: Field = Field::new("check", 80, 16);
    pub const SRC_ADDR: Field = Field::new("saddr", 96, 32);
    pub const DST_ADDR: Field = Field::new("daddr", 128, 32);

    pub const HEADER_V1: HeaderFormat = HeaderFormat {
        name: "ipv4",
        version: 1,
        fixed_bytes: 20,
        fields: &[
            VERSION,
            IHL,
            DSCP,
            ECN,
            TOTAL_LENGTH,
            IDENTIFICATION,
            FLAGS,
            FRAGMENT_OFFSET,
            TTL,
            PROTOCOL,
            CHECKSUM,
            SRC_ADDR,
            DST_ADDR,
        ],
    };
}

/// IPv6 fixed header fields (RFC 8200)
pub mod ipv6 {
    use super::{Field, HeaderFormat};

    pub const VERSION: Field = Field::new("version", 0, 4);
    pub const DSCP: Field = Field::new("dscp", 4, 6);
    pub const ECN: Field = Field::new("ecn", 10, 2);
    pub const FLOW_LABEL: Field = Field::new("flow_label", 12, 20);
    pub const PAYLOAD_LENGTH: Field = Field::new("payload_len", 32, 16);
    pub const NEXT_HEADER: Field = Field::new("nexthdr", 48, 8);
    pub const HOP_LIMIT: Field = Field::new("hop_limit", 56, 8);
    pub const SRC_ADDR: Field = Field::new("saddr", 64, 128);
    pub const DST_ADDR: Field = Field::new("daddr", 192, 128);

    pub const HEADER_V1: HeaderFormat = HeaderFormat {
        name: "ipv6",
        version: 1,
        fixed_bytes: 40,
        fields: &[
            VERSION,
            DSCP,
            ECN,
            FLOW_LABEL,
            PAYLOAD_LENGTH,
            NEXT_HEADER,
            HOP_LIMIT,
            SRC_ADDR,
            DST_ADDR,
        ],
    };
}

fn check_bounds(format: &HeaderFormat, len: usize) -> Result<()> {
    if len < format.fixed_bytes {
        return Err(Error::construction(format!(
            "{} v{} header needs {} bytes, got {}",
            format.name, format.version, format.fixed_bytes, len
        )));
    }
    Ok(())
}

/// Writes field values into a header region
pub struct FieldWriter<'a> {
    format: &'static HeaderFormat,
    buf: &'a mut [u8],
}

impl<'a> FieldWriter<'a> {
    /// Wrap `buf`, which must hold at least the fixed part of `format`
    pub fn new(format: &'static HeaderFormat, buf: &'a mut [u8]) -> Result<Self> {
        check_bounds(format, buf.len())?;
        Ok(FieldWriter { format, buf })
    }

    /// Store `value` into `field`, most significant bit first
    pub fn set(&mut self, field: &Field, value: u128) -> Result<&mut Self> {
        if field.end_bit() > self.format.fixed_bytes * 8 {
            return Err(Error::construction(format!(
                "field {} lies outside the {} header",
                field.name, self.format.name
            )));
        }
        if value > field.max_value() {
            return Err(Error::construction(format!(
                "value {} does not fit the {}-bit {} field {}",
                value, field.bit_width, self.format.name, field.name
            )));
        }
        for i in 0..field.bit_width {
            let bit = field.bit_offset + i;
            let mask = 0x80u8 >> (bit % 8);
            if (value >> (field.bit_width - 1 - i)) & 1 == 1 {
                self.buf[bit / 8] |= mask;
            } else {
                self.buf[bit / 8] &= !mask;
            }
        }
        Ok(self)
    }

    /// Store a boolean into a one-bit field
    pub fn set_bit(&mut self, field: &Field, on: bool) -> Result<&mut Self> {
        self.set(field, u128::from(on))
    }

    /// Bytes following the fixed part of the header
    pub fn options_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.format.fixed_bytes..]
    }
}

/// Reads field values back out of a header region
pub struct FieldReader<'a> {
    format: &'static HeaderFormat,
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub fn new(format: &'static HeaderFormat, buf: &'a [u8]) -> Result<Self> {
        check_bounds(format, buf.len())?;
        Ok(FieldReader { format, buf })
    }

    /// Read `field`; fields of the wrong format read as zero past the end
    pub fn get(&self, field: &Field) -> u128 {
        let mut value = 0u128;
        for i in 0..field.bit_width {
            let bit = field.bit_offset + i;
            let byte = self.buf.get(bit / 8).copied().unwrap_or(0);
            value = (value << 1) | u128::from((byte >> (7 - bit % 8)) & 1);
        }
        value
    }

    pub fn get_bit(&self, field: &Field) -> bool {
        self.get(field) == 1
    }

    pub fn format(&self) -> &'static HeaderFormat {
        self.format
    }
}
