//! Value encoding/decoding.
//!
//! ```text
//! value := header [count:0|1|2] [content-length:0|1|2] content
//! ```
//!
//! Content is the raw payload of a scalar, or the concatenated encodings of
//! the children of an array or record list. Child boundaries are recovered
//! by decoding each child in turn; nothing nested is decoded until asked for.

use crate::codec::children::ChildTable;
use crate::codec::header::{ValueHeader, Width};
use crate::codec::primitives::{Reader, Writer};
use crate::codec::record::{encode_record_into, MappedRecord};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{DEFAULT_MAX_DEPTH, MAX_CONTENT_LEN, MAX_ELEMENTS, MAX_SCALAR_LEN};
use crate::model::{Kind, Value, ValueView};

// =============================================================================
// DECODING
// =============================================================================

#[derive(Debug, Clone)]
enum Children<'a> {
    None,
    Values(ChildTable<MappedValue<'a>>),
    Records(ChildTable<MappedRecord<'a>>),
}

/// A value decoded in place over a borrowed buffer.
///
/// Only the header, count and content bounds are read on construction.
/// Children are decoded on first access and cached, so repeated access is
/// cheap and never copies content bytes.
#[derive(Debug, Clone)]
pub struct MappedValue<'a> {
    buf: &'a [u8],
    header: ValueHeader,
    content: &'a [u8],
    children: Children<'a>,
}

impl<'a> MappedValue<'a> {
    /// Wraps the value at the start of `buf`.
    ///
    /// Bytes after the value are ignored; see [`MappedValue::encoded_len`].
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        Self::decode_prefix(buf).map(|(value, _)| value)
    }

    /// Wraps the value at the start of `buf` and returns its encoded length.
    pub fn decode_prefix(buf: &'a [u8]) -> Result<(Self, usize), DecodeError> {
        let mut reader = Reader::new(buf);
        let header = ValueHeader::parse(reader.read_byte("value header")?)?;
        let count = reader.read_sized(header.count_width.bytes(), "element count")?;
        let len = reader.read_sized(header.content_width.bytes(), "content length")?;
        let content = reader.read_bytes(len, "value content")?;

        // Every child occupies at least its header byte.
        if count > content.len() {
            return Err(DecodeError::TruncatedBuffer {
                context: "element count",
                needed: count,
                available: content.len(),
            });
        }

        let children = match header.kind {
            Kind::Array => Children::Values(ChildTable::new(count)),
            Kind::RecordList => Children::Records(ChildTable::new(count)),
            Kind::Absent | Kind::Scalar => Children::None,
        };

        let consumed = reader.position();
        Ok((
            Self {
                buf: &buf[..consumed],
                header,
                content,
                children,
            },
            consumed,
        ))
    }

    /// Returns exactly the bytes of this value.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    /// Returns the number of bytes this value occupies.
    pub fn encoded_len(&self) -> usize {
        self.buf.len()
    }

    /// Returns the decoded header.
    pub fn header(&self) -> ValueHeader {
        self.header
    }

    /// Returns the content region (scalar payload or concatenated children).
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Returns the scalar payload, borrowed from the input buffer.
    pub fn scalar(&self) -> Option<&'a [u8]> {
        match self.header.kind {
            Kind::Scalar => Some(self.content),
            _ => None,
        }
    }

    /// Returns array element `index`, decoding it on first access.
    pub fn value_at(&self, index: usize) -> Result<&MappedValue<'a>, DecodeError> {
        match &self.children {
            Children::Values(table) => {
                table.get_or_decode(self.content, index, MappedValue::decode_prefix)
            }
            _ => Err(DecodeError::WrongKind {
                expected: Kind::Array,
                found: self.header.kind,
            }),
        }
    }

    /// Returns record `index` of a record list, decoding it on first access.
    pub fn record_at(&self, index: usize) -> Result<&MappedRecord<'a>, DecodeError> {
        match &self.children {
            Children::Records(table) => {
                table.get_or_decode(self.content, index, MappedRecord::decode_prefix)
            }
            _ => Err(DecodeError::WrongKind {
                expected: Kind::RecordList,
                found: self.header.kind,
            }),
        }
    }

    /// Iterates over array elements. Empty for other kinds.
    pub fn values(&self) -> impl Iterator<Item = Result<&MappedValue<'a>, DecodeError>> + '_ {
        let count = match &self.children {
            Children::Values(table) => table.count(),
            _ => 0,
        };
        (0..count).map(move |i| self.value_at(i))
    }

    /// Iterates over records of a record list. Empty for other kinds.
    pub fn records(&self) -> impl Iterator<Item = Result<&MappedRecord<'a>, DecodeError>> + '_ {
        let count = match &self.children {
            Children::Records(table) => table.count(),
            _ => 0,
        };
        (0..count).map(move |i| self.record_at(i))
    }

    /// Decodes the whole tree and checks that children exactly fill their
    /// parents' content.
    pub fn validate(&self, max_depth: usize) -> Result<(), DecodeError> {
        self.validate_at(0, max_depth)
    }

    fn validate_at(&self, depth: usize, max_depth: usize) -> Result<(), DecodeError> {
        if depth > max_depth {
            return Err(DecodeError::NestingTooDeep { max: max_depth });
        }

        let end = match &self.children {
            Children::None => return Ok(()),
            Children::Values(table) => {
                for index in 0..table.count() {
                    self.value_at(index)?
                        .validate_at(depth + 1, max_depth)
                        .map_err(|err| DecodeError::CorruptChild {
                            index,
                            source: Box::new(err),
                        })?;
                }
                last_end(table)
            }
            Children::Records(table) => {
                for index in 0..table.count() {
                    self.record_at(index)?;
                }
                last_end(table)
            }
        };

        if end != self.content.len() {
            log::debug!(
                "{:?} content has {} unused bytes",
                self.header.kind,
                self.content.len() - end
            );
            return Err(DecodeError::TrailingBytes {
                context: "value content",
                count: self.content.len() - end,
            });
        }
        Ok(())
    }

    /// Copies this value into an equivalent constructed [`Value`].
    pub fn to_value(&self) -> Result<Value, DecodeError> {
        self.to_value_at(0, DEFAULT_MAX_DEPTH)
    }

    fn to_value_at(&self, depth: usize, max_depth: usize) -> Result<Value, DecodeError> {
        if depth > max_depth {
            return Err(DecodeError::NestingTooDeep { max: max_depth });
        }

        Ok(match self.header.kind {
            Kind::Absent => Value::absent(),
            Kind::Scalar => Value::scalar(self.content),
            Kind::Array => {
                let mut elements = Vec::with_capacity(self.count());
                for element in self.values() {
                    elements.push(element?.to_value_at(depth + 1, max_depth)?);
                }
                Value::array_from(elements)
            }
            Kind::RecordList => {
                let mut records = Vec::with_capacity(self.count());
                for record in self.records() {
                    records.push(record?.to_record());
                }
                Value::record_list_from(records)
            }
        })
    }
}

fn last_end<T>(table: &ChildTable<T>) -> usize {
    match table.count() {
        0 => 0,
        count => table.end_of(count - 1).unwrap_or(0),
    }
}

impl ValueView for MappedValue<'_> {
    fn kind(&self) -> Kind {
        self.header.kind
    }

    fn count(&self) -> usize {
        match &self.children {
            Children::None => 0,
            Children::Values(table) => table.count(),
            Children::Records(table) => table.count(),
        }
    }

    fn scalar_bytes(&self) -> Option<&[u8]> {
        self.scalar()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a constructed value into a new buffer.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    encode_value_into(&mut writer, value, 0)?;
    log::trace!("encoded {:?} value: {} bytes", value.kind(), writer.len());
    Ok(writer.into_bytes())
}

/// Appends the encoding of `value` to `writer`.
pub(crate) fn encode_value_into(
    writer: &mut Writer,
    value: &Value,
    depth: usize,
) -> Result<(), EncodeError> {
    if depth > DEFAULT_MAX_DEPTH {
        return Err(EncodeError::NestingTooDeep {
            max: DEFAULT_MAX_DEPTH,
        });
    }

    // A cached buffer is always current: mutations clear it.
    if let Ok(buf) = value.buf() {
        writer.write_bytes(buf);
        return Ok(());
    }

    if let Some(bytes) = value.as_scalar() {
        return write_framed(writer, Kind::Scalar, 0, bytes, "scalar", MAX_SCALAR_LEN);
    }

    if let Some(elements) = value.as_array() {
        check_count(elements.len(), "array")?;
        let mut content = Writer::new();
        for element in elements {
            encode_value_into(&mut content, element, depth + 1)?;
        }
        return write_framed(
            writer,
            Kind::Array,
            elements.len(),
            content.as_bytes(),
            "array content",
            MAX_CONTENT_LEN,
        );
    }

    if let Some(records) = value.as_records() {
        check_count(records.len(), "record list")?;
        let mut content = Writer::new();
        for (index, record) in records.iter().enumerate() {
            // The decoder reads 64 bytes after a timestamp as its signature,
            // which would swallow the following siblings.
            let unsigned = record.timestamp().is_some() && record.signature().is_none();
            if unsigned && index + 1 < records.len() {
                return Err(EncodeError::UnsignedRecordNotLast { index });
            }
            encode_record_into(&mut content, record)?;
        }
        return write_framed(
            writer,
            Kind::RecordList,
            records.len(),
            content.as_bytes(),
            "record-list content",
            MAX_CONTENT_LEN,
        );
    }

    write_framed(writer, Kind::Absent, 0, &[], "value", MAX_SCALAR_LEN)
}

fn check_count(count: usize, field: &'static str) -> Result<(), EncodeError> {
    if count > MAX_ELEMENTS {
        return Err(EncodeError::TooManyElements {
            field,
            len: count,
            max: MAX_ELEMENTS,
        });
    }
    Ok(())
}

fn write_framed(
    writer: &mut Writer,
    kind: Kind,
    count: usize,
    content: &[u8],
    field: &'static str,
    max: usize,
) -> Result<(), EncodeError> {
    let too_large = || EncodeError::ValueTooLarge {
        field,
        len: content.len(),
        max,
    };
    if content.len() > max {
        return Err(too_large());
    }
    let content_width = Width::for_len(content.len()).ok_or_else(too_large)?;
    let count_width = match kind {
        Kind::Array | Kind::RecordList => Width::for_count(count).ok_or_else(too_large)?,
        Kind::Absent | Kind::Scalar => Width::Absent,
    };

    let header = ValueHeader {
        kind,
        count_width,
        content_width,
    };
    writer.write_byte(header.to_byte());
    writer.write_sized(count, count_width.bytes());
    writer.write_sized(content.len(), content_width.bytes());
    writer.write_bytes(content);
    Ok(())
}
