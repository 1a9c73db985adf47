//! Primitive encoding/decoding for the kvwire binary format.
//!
//! Implements unsigned varints (base-128, little-endian groups), varchars
//! (varint length + raw bytes) and the fixed-width big-endian fields used by
//! value and record headers.

use crate::error::DecodeError;
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Encodes `value` as an unsigned varint.
pub fn encode_uvarint(value: u64) -> Vec<u8> {
    let mut writer = Writer::with_capacity(MAX_VARINT_BYTES);
    writer.write_varint(value);
    writer.into_bytes()
}

/// Decodes an unsigned varint from the start of `buf`.
///
/// Returns the value and the number of bytes consumed. An empty input yields
/// `(0, 0)`: callers that need a value must check the consumed count rather
/// than treat that as a zero.
pub fn decode_uvarint(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    if buf.is_empty() {
        return Ok((0, 0));
    }
    varint_at(buf, "uvarint")
}

/// Encodes `bytes` as a varchar: varint length followed by the raw bytes.
pub fn encode_varchar(bytes: &[u8]) -> Vec<u8> {
    let mut writer = Writer::with_capacity(MAX_VARINT_BYTES + bytes.len());
    writer.write_varchar(bytes);
    writer.into_bytes()
}

/// Decodes a varchar from the start of `buf`, borrowing its content.
///
/// Returns the content and the total number of bytes consumed.
pub fn decode_varchar(buf: &[u8]) -> Result<(&[u8], usize), DecodeError> {
    let mut reader = Reader::new(buf);
    let content = reader.read_varchar("varchar")?;
    Ok((content, reader.position()))
}

fn varint_at(data: &[u8], context: &'static str) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;

    for (i, &byte) in data.iter().take(MAX_VARINT_BYTES).enumerate() {
        let value = (byte & 0x7F) as u64;

        // The tenth group only has room for the top bit of a u64.
        if i == MAX_VARINT_BYTES - 1 && (value > 1 || byte & 0x80 != 0) {
            return Err(DecodeError::MalformedVarint {
                context,
                reason: "value exceeds u64",
            });
        }

        result |= value << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(DecodeError::MalformedVarint {
        context,
        reason: "truncated continuation",
    })
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides bounds-checked reads. Every slice it
/// returns borrows from the original input.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::TruncatedBuffer {
            context,
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining_len();
        if n > available {
            return Err(DecodeError::TruncatedBuffer {
                context,
                needed: n,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads an unsigned varint.
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        if self.is_empty() {
            return Err(DecodeError::TruncatedBuffer {
                context,
                needed: 1,
                available: 0,
            });
        }
        let (value, consumed) = varint_at(self.remaining(), context)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Reads a varchar, borrowing its content.
    #[inline]
    pub fn read_varchar(&mut self, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint(context)?;
        let available = self.remaining_len();
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= available)
            .ok_or(DecodeError::TruncatedBuffer {
                context,
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                available,
            })?;
        self.read_bytes(len, context)
    }

    /// Reads a big-endian unsigned integer of `width` bytes (0, 1 or 2).
    ///
    /// A width of zero reads nothing and yields zero.
    #[inline]
    pub fn read_sized(&mut self, width: usize, context: &'static str) -> Result<usize, DecodeError> {
        let bytes = self.read_bytes(width, context)?;
        Ok(bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize))
    }

    /// Reads a big-endian i64.
    #[inline]
    pub fn read_i64_be(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.read_array(context)?))
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned varint.
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }

    /// Writes a varchar (varint length + bytes).
    pub fn write_varchar(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `value` big-endian in `width` bytes (0, 1 or 2).
    ///
    /// The caller has already picked a width that holds the value.
    #[inline]
    pub fn write_sized(&mut self, value: usize, width: usize) {
        match width {
            0 => {}
            1 => self.buf.push(value as u8),
            _ => self.buf.extend_from_slice(&(value as u16).to_be_bytes()),
        }
    }

    /// Writes a big-endian i64.
    pub fn write_i64_be(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }
}
