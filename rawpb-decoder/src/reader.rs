//! Wire format primitives
//!
//! A cursor over a byte slice that reads field tags, varints, fixed-width
//! little-endian integers and length-delimited payloads. Payloads borrow
//! from the input; nothing is copied.

use crate::types::{Error, FieldNumber, Result, WireType, MAX_FIELD_NUMBER};
use byteorder::{ByteOrder, LittleEndian};

/// Longest possible encoding of a 64-bit varint
pub const MAX_VARINT_LEN: usize = 10;

/// Reader over one message's bytes
#[derive(Debug, Clone)]
pub struct WireReader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> WireReader<'b> {
    /// Create a reader positioned at the start of `buf`
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once all input is consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'b [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::Truncated {
                needed: len,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a base-128 varint
    ///
    /// The tenth byte may only carry the single remaining bit of a `u64`.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.take(1)?[0];
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(Error::VarintOverflow);
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(Error::VarintOverflow)
    }

    /// Read an 8-byte little-endian integer
    pub fn read_fixed64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Read a 4-byte little-endian integer
    pub fn read_fixed32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Read a varint length prefix and the payload it announces
    pub fn read_length_delimited(&mut self) -> Result<&'b [u8]> {
        let len = self.read_varint()?;
        let remaining = self.remaining();
        let len = usize::try_from(len).map_err(|_| Error::Truncated {
            needed: usize::MAX,
            remaining,
        })?;
        self.take(len)
    }

    /// Read a field tag and split it into field number and wire type
    pub fn read_tag(&mut self) -> Result<(FieldNumber, WireType)> {
        let tag = self.read_varint()?;
        let number = tag >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(Error::InvalidFieldNumber(number));
        }
        let field_number = number as FieldNumber;
        let bits = (tag & 0x07) as u8;

        WireType::from_tag_bits(bits)
            .map(|wire_type| (field_number, wire_type))
            .ok_or(Error::UnsupportedWireType {
                field_number,
                wire_type: bits,
            })
    }
}
