//! Record encoding/decoding.
//!
//! ```text
//! record := header [key-len key] [value-len value] [scheme-len scheme]
//!           [timestamp:8 [r:32 s:32]]
//! ```
//!
//! Field lengths are 0, 1 or 2 bytes wide as selected by the header. When the
//! timestamp bit is set the timestamp always follows; the signature is only
//! read if at least 64 bytes remain after it.

use crate::codec::header::{RecordHeader, Width};
use crate::codec::key::MappedKey;
use crate::codec::primitives::{Reader, Writer};
use crate::codec::scheme::MappedScheme;
use crate::codec::value::MappedValue;
use crate::digest::{content_hash, ContentHash};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_FIELD_LEN, SIGNATURE_LEN};
use crate::model::{Record, Signature};

/// A record decoded in place over a borrowed buffer.
///
/// All five fields are located on construction; field contents stay
/// borrowed from the input.
#[derive(Debug, Clone)]
pub struct MappedRecord<'a> {
    buf: &'a [u8],
    header: RecordHeader,
    key: Option<&'a [u8]>,
    value: Option<&'a [u8]>,
    scheme: Option<&'a [u8]>,
    timestamp: Option<i64>,
    signature: Option<Signature>,
}

impl<'a> MappedRecord<'a> {
    /// Wraps the record at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        Self::decode_prefix(buf).map(|(record, _)| record)
    }

    /// Wraps the record at the start of `buf` and returns its encoded length.
    pub fn decode_prefix(buf: &'a [u8]) -> Result<(Self, usize), DecodeError> {
        let mut reader = Reader::new(buf);
        let header = RecordHeader::parse(reader.read_byte("record header")?)?;

        let key = read_field(&mut reader, header.key, "key")?;
        let value = read_field(&mut reader, header.value, "value")?;
        let scheme = read_field(&mut reader, header.scheme, "scheme")?;

        let mut timestamp = None;
        let mut signature = None;
        if header.stamped {
            timestamp = Some(
                reader
                    .read_i64_be("timestamp")
                    .map_err(|err| err.in_field("timestamp"))?,
            );
            if reader.remaining_len() >= SIGNATURE_LEN {
                let r = reader.read_array("signature r")?;
                let s = reader.read_array("signature s")?;
                signature = Some(Signature::new(r, s));
            } else {
                log::debug!(
                    "timestamped record without signature ({} bytes remain)",
                    reader.remaining_len()
                );
            }
        }

        let consumed = reader.position();
        Ok((
            Self {
                buf: &buf[..consumed],
                header,
                key,
                value,
                scheme,
                timestamp,
                signature,
            },
            consumed,
        ))
    }

    /// Returns exactly the bytes of this record.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    pub fn encoded_len(&self) -> usize {
        self.buf.len()
    }

    pub fn header(&self) -> RecordHeader {
        self.header
    }

    /// Raw key region.
    pub fn key(&self) -> Option<&'a [u8]> {
        self.key
    }

    /// Raw value region.
    pub fn value(&self) -> Option<&'a [u8]> {
        self.value
    }

    /// Raw scheme region.
    pub fn scheme(&self) -> Option<&'a [u8]> {
        self.scheme
    }

    /// Nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Decodes the key region as a [`MappedKey`].
    pub fn key_as_key(&self) -> Result<Option<MappedKey<'a>>, DecodeError> {
        self.key
            .map(|bytes| MappedKey::new(bytes).map_err(|err| err.in_field("key")))
            .transpose()
    }

    /// Decodes the value region as a [`MappedValue`] filling the whole region.
    pub fn value_as_value(&self) -> Result<Option<MappedValue<'a>>, DecodeError> {
        self.value
            .map(|bytes| {
                let (value, len) =
                    MappedValue::decode_prefix(bytes).map_err(|err| err.in_field("value"))?;
                if len != bytes.len() {
                    return Err(DecodeError::TrailingBytes {
                        context: "value",
                        count: bytes.len() - len,
                    }
                    .in_field("value"));
                }
                Ok(value)
            })
            .transpose()
    }

    /// Decodes the scheme region as a [`MappedScheme`].
    pub fn scheme_as_scheme(&self) -> Result<Option<MappedScheme<'a>>, DecodeError> {
        self.scheme
            .map(|bytes| MappedScheme::new(bytes).map_err(|err| err.in_field("scheme")))
            .transpose()
    }

    /// Copies this record into a constructed [`Record`].
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(key) = self.key {
            record.set_key_bytes(key);
        }
        if let Some(value) = self.value {
            record.set_value_bytes(value);
        }
        if let Some(scheme) = self.scheme {
            record.set_scheme_bytes(scheme);
        }
        record.set_timestamp(self.timestamp);
        record.set_signature(self.signature);
        record
    }

    /// SHA-256 of the record's bytes.
    pub fn content_hash(&self) -> ContentHash {
        content_hash(self.buf)
    }
}

fn read_field<'a>(
    reader: &mut Reader<'a>,
    width: Width,
    field: &'static str,
) -> Result<Option<&'a [u8]>, DecodeError> {
    if width == Width::Absent {
        return Ok(None);
    }
    let len = reader
        .read_sized(width.bytes(), "field length")
        .map_err(|err| err.in_field(field))?;
    let bytes = reader
        .read_bytes(len, "field content")
        .map_err(|err| err.in_field(field))?;
    Ok(Some(bytes))
}

/// Encodes a constructed record into a new buffer.
pub fn encode_record(record: &Record) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    encode_record_into(&mut writer, record)?;
    Ok(writer.into_bytes())
}

/// Appends the encoding of `record` to `writer`.
pub(crate) fn encode_record_into(writer: &mut Writer, record: &Record) -> Result<(), EncodeError> {
    if let Ok(buf) = record.buf() {
        writer.write_bytes(buf);
        return Ok(());
    }

    if record.signature().is_some() && record.timestamp().is_none() {
        return Err(EncodeError::SignatureWithoutTimestamp);
    }

    let key = record.key().unwrap_or_default();
    let value = record.value().unwrap_or_default();
    let scheme = record.scheme().unwrap_or_default();

    let header = RecordHeader {
        key: field_width(key, "key")?,
        value: field_width(value, "value")?,
        scheme: field_width(scheme, "scheme")?,
        stamped: record.timestamp().is_some(),
    };

    writer.write_byte(header.to_byte());
    for (width, bytes) in [(header.key, key), (header.value, value), (header.scheme, scheme)] {
        writer.write_sized(bytes.len(), width.bytes());
        writer.write_bytes(bytes);
    }
    if let Some(timestamp) = record.timestamp() {
        writer.write_i64_be(timestamp);
        if let Some(signature) = record.signature() {
            writer.write_bytes(&signature.r);
            writer.write_bytes(&signature.s);
        }
    }
    Ok(())
}

fn field_width(bytes: &[u8], field: &'static str) -> Result<Width, EncodeError> {
    if bytes.len() > MAX_FIELD_LEN {
        return Err(EncodeError::ValueTooLarge {
            field,
            len: bytes.len(),
            max: MAX_FIELD_LEN,
        });
    }
    Width::for_len(bytes.len()).ok_or(EncodeError::ValueTooLarge {
        field,
        len: bytes.len(),
        max: MAX_FIELD_LEN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::limits::TIMESTAMP_LEN;
    use crate::model::{Key, Kind, Scheme, Value, ValueView};

    fn signature() -> Signature {
        Signature::new([0x11; 32], [0x22; 32])
    }

    #[test]
    fn test_three_field_layout() {
        let record = Record::new()
            .with_key_bytes(b"ab".to_vec())
            .with_value_bytes(b"cd".to_vec())
            .with_scheme_bytes(b"ef".to_vec());
        let bytes = encode_record(&record).unwrap();
        assert_eq!(bytes, [0x54, 0x02, b'a', b'b', 0x02, b'c', b'd', 0x02, b'e', b'f']);

        let mapped = MappedRecord::new(&bytes).unwrap();
        assert_eq!(mapped.key(), Some(&b"ab"[..]));
        assert_eq!(mapped.value(), Some(&b"cd"[..]));
        assert_eq!(mapped.scheme(), Some(&b"ef"[..]));
        assert_eq!(mapped.timestamp(), None);
        assert_eq!(mapped.encoded_len(), bytes.len());
    }

    #[test]
    fn test_signed_record() {
        let record = Record::new()
            .with_key_bytes(b"k".to_vec())
            .with_timestamp(-42)
            .with_signature(signature());
        let bytes = encode_record(&record).unwrap();
        assert_eq!(bytes.len(), 1 + 2 + TIMESTAMP_LEN + SIGNATURE_LEN);
        assert_eq!(bytes[0], 0x41);

        let mapped = MappedRecord::new(&bytes).unwrap();
        assert_eq!(mapped.timestamp(), Some(-42));
        assert_eq!(mapped.signature(), Some(&signature()));
        assert_eq!(mapped.to_record(), record);
    }

    #[test]
    fn test_timestamp_without_signature() {
        let record = Record::new().with_timestamp(1_000);
        let bytes = encode_record(&record).unwrap();
        assert_eq!(bytes, [0x01, 0, 0, 0, 0, 0, 0, 0x03, 0xE8]);

        let mapped = MappedRecord::new(&bytes).unwrap();
        assert_eq!(mapped.timestamp(), Some(1_000));
        assert!(!mapped.is_signed());
    }

    #[test]
    fn test_short_tail_is_not_a_signature() {
        let mut bytes = encode_record(&Record::new().with_timestamp(7)).unwrap();
        bytes.extend_from_slice(&[0xAA; 63]);
        let mapped = MappedRecord::new(&bytes).unwrap();
        assert!(mapped.signature().is_none());
        assert_eq!(mapped.encoded_len(), 9);
    }

    #[test]
    fn test_signature_requires_timestamp() {
        let record = Record::new().with_signature(signature());
        assert_eq!(encode_record(&record), Err(EncodeError::SignatureWithoutTimestamp));
    }

    #[test]
    fn test_zero_length_field_is_absent() {
        let record = Record::new().with_key_bytes(Vec::new());
        assert_eq!(encode_record(&record).unwrap(), [0x00]);
    }

    #[test]
    fn test_field_too_large() {
        let record = Record::new().with_value_bytes(vec![0; MAX_FIELD_LEN + 1]);
        let err = encode_record(&record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueTooLarge);
    }

    #[test]
    fn test_truncated_field_names_field() {
        let err = MappedRecord::new(&[0x10, 0x05, b'a']).unwrap_err();
        assert!(matches!(err, DecodeError::Field { field: "value", .. }));
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer);
    }

    #[test]
    fn test_reserved_bit_rejected() {
        assert!(matches!(
            MappedRecord::new(&[0x02]),
            Err(DecodeError::ReservedBitsSet { .. })
        ));
    }

    #[test]
    fn test_typed_field_access() {
        let key = Key::from_sub_keys([b"users".to_vec(), b"7".to_vec()]).unwrap();
        let value = Value::array_from([Value::scalar(b"x".to_vec())]);
        let scheme = Scheme::new().with_domain(b"eu".to_vec());
        let record = Record::new()
            .with_key(&key)
            .with_value(&value)
            .unwrap()
            .with_scheme(&scheme);
        let bytes = encode_record(&record).unwrap();
        let mapped = MappedRecord::new(&bytes).unwrap();

        assert_eq!(mapped.key_as_key().unwrap().unwrap(), key);
        let mapped_value = mapped.value_as_value().unwrap().unwrap();
        assert_eq!(mapped_value.kind(), Kind::Array);
        assert_eq!(mapped_value.to_value().unwrap(), value);
        assert_eq!(
            mapped.scheme_as_scheme().unwrap().unwrap().domain(),
            Some(&b"eu"[..])
        );
    }

    #[test]
    fn test_typed_access_wraps_errors() {
        // Value region holds a scalar followed by a stray byte.
        let record = Record::new().with_value_bytes(vec![0x01, 0x01, b'a', 0xFF]);
        let bytes = encode_record(&record).unwrap();
        let mapped = MappedRecord::new(&bytes).unwrap();
        let err = mapped.value_as_value().unwrap_err();
        assert!(matches!(err, DecodeError::Field { field: "value", .. }));
        assert!(matches!(
            err.root_cause(),
            DecodeError::TrailingBytes { count: 1, .. }
        ));
        assert_eq!(mapped.key_as_key().unwrap(), None);
    }

    #[test]
    fn test_content_hash_agrees() {
        let record = Record::new().with_key_bytes(b"abc".to_vec()).with_timestamp(9);
        let bytes = encode_record(&record).unwrap();
        let mapped = MappedRecord::new(&bytes).unwrap();
        assert_eq!(mapped.content_hash(), record.content_hash().unwrap());
    }
}
