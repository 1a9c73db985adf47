//! Header byte layouts for values and records.
//!
//! ```text
//! value:  [array-size:2][recordlist-size:2][lookup:1][compression:1][content-length:2]
//! record: [key-len:2][value-len:2][scheme-len:2][reserved:1][timestamp:1]
//! ```
//!
//! Every two-bit code selects the width of the field that follows:
//! 0 = absent, 1 = one byte, 2 = two bytes big-endian, 3 = reserved.

use crate::error::DecodeError;
use crate::model::Kind;

const ARRAY_SHIFT: u8 = 6;
const RECORD_LIST_SHIFT: u8 = 4;
const LOOKUP_FLAG: u8 = 0x08;
const COMPRESSION_FLAG: u8 = 0x04;
const CODE_MASK: u8 = 0x03;

const KEY_SHIFT: u8 = 6;
const VALUE_SHIFT: u8 = 4;
const SCHEME_SHIFT: u8 = 2;
const RECORD_RESERVED_FLAG: u8 = 0x02;
const TIMESTAMP_FLAG: u8 = 0x01;

/// Width of a length or count field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// No field; the thing it would describe is absent.
    Absent,
    /// One byte.
    U8,
    /// Two bytes, big-endian.
    U16,
}

impl Width {
    /// Decodes a two-bit width code.
    pub fn from_code(code: u8, field: &'static str) -> Result<Width, DecodeError> {
        match code {
            0 => Ok(Width::Absent),
            1 => Ok(Width::U8),
            2 => Ok(Width::U16),
            _ => Err(DecodeError::UnsupportedEncoding { field, code }),
        }
    }

    /// Returns the two-bit wire code.
    pub fn code(self) -> u8 {
        match self {
            Width::Absent => 0,
            Width::U8 => 1,
            Width::U16 => 2,
        }
    }

    /// Returns the number of bytes the field occupies.
    pub fn bytes(self) -> usize {
        self.code() as usize
    }

    /// Picks the narrowest width for a length, with zero mapping to absent.
    ///
    /// Returns `None` if the length does not fit in two bytes.
    pub fn for_len(len: usize) -> Option<Width> {
        match len {
            0 => Some(Width::Absent),
            1..=0xFF => Some(Width::U8),
            0x100..=0xFFFF => Some(Width::U16),
            _ => None,
        }
    }

    /// Picks the width for an element count.
    ///
    /// Unlike lengths, a count of zero still gets a one-byte field so that an
    /// empty array stays distinguishable from an absent value.
    pub fn for_count(count: usize) -> Option<Width> {
        match count {
            0..=0xFF => Some(Width::U8),
            0x100..=0xFFFF => Some(Width::U16),
            _ => None,
        }
    }
}

/// Decoded value header.
///
/// The kind is resolved when the byte is parsed, so the array/record-list
/// exclusion never has to be re-checked downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueHeader {
    pub kind: Kind,
    pub count_width: Width,
    pub content_width: Width,
}

impl ValueHeader {
    /// Parses a value header byte.
    pub fn parse(byte: u8) -> Result<ValueHeader, DecodeError> {
        let array = Width::from_code((byte >> ARRAY_SHIFT) & CODE_MASK, "array size")?;
        let records = Width::from_code((byte >> RECORD_LIST_SHIFT) & CODE_MASK, "record-list size")?;
        let content_width = Width::from_code(byte & CODE_MASK, "content length")?;

        if array != Width::Absent && records != Width::Absent {
            return Err(DecodeError::ConflictingKind { header: byte });
        }
        if byte & LOOKUP_FLAG != 0 {
            return Err(DecodeError::UnsupportedExtension { extension: "lookup" });
        }
        if byte & COMPRESSION_FLAG != 0 {
            return Err(DecodeError::UnsupportedExtension {
                extension: "compression",
            });
        }

        let (kind, count_width) = if array != Width::Absent {
            (Kind::Array, array)
        } else if records != Width::Absent {
            (Kind::RecordList, records)
        } else if content_width != Width::Absent {
            (Kind::Scalar, Width::Absent)
        } else {
            (Kind::Absent, Width::Absent)
        };

        Ok(ValueHeader {
            kind,
            count_width,
            content_width,
        })
    }

    /// Packs the header back into its wire byte.
    pub fn to_byte(&self) -> u8 {
        let count = match self.kind {
            Kind::Array => self.count_width.code() << ARRAY_SHIFT,
            Kind::RecordList => self.count_width.code() << RECORD_LIST_SHIFT,
            Kind::Absent | Kind::Scalar => 0,
        };
        count | self.content_width.code()
    }
}

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: Width,
    pub value: Width,
    pub scheme: Width,
    /// Timestamp present (signature may follow).
    pub stamped: bool,
}

impl RecordHeader {
    /// Parses a record header byte.
    pub fn parse(byte: u8) -> Result<RecordHeader, DecodeError> {
        if byte & RECORD_RESERVED_FLAG != 0 {
            return Err(DecodeError::ReservedBitsSet {
                context: "record",
                header: byte,
            });
        }
        Ok(RecordHeader {
            key: Width::from_code((byte >> KEY_SHIFT) & CODE_MASK, "key length")?,
            value: Width::from_code((byte >> VALUE_SHIFT) & CODE_MASK, "value length")?,
            scheme: Width::from_code((byte >> SCHEME_SHIFT) & CODE_MASK, "scheme length")?,
            stamped: byte & TIMESTAMP_FLAG != 0,
        })
    }

    /// Packs the header back into its wire byte.
    pub fn to_byte(&self) -> u8 {
        (self.key.code() << KEY_SHIFT)
            | (self.value.code() << VALUE_SHIFT)
            | (self.scheme.code() << SCHEME_SHIFT)
            | if self.stamped { TIMESTAMP_FLAG } else { 0 }
    }
}
