//! Binary encoding/decoding for kvwire.
//!
//! Mapped types ([`MappedValue`], [`MappedKey`], [`MappedRecord`],
//! [`MappedScheme`]) borrow the input buffer and decode lazily. The
//! `encode_*` functions serialize constructed types from [`crate::model`].

pub(crate) mod children;
pub mod header;
pub mod key;
pub mod primitives;
pub mod record;
pub mod scheme;
pub mod value;

pub use header::{RecordHeader, ValueHeader, Width};
pub use key::{encode_key, MappedKey};
pub use primitives::{decode_uvarint, decode_varchar, encode_uvarint, encode_varchar, Reader, Writer};
pub use record::{encode_record, MappedRecord};
pub use scheme::{encode_scheme, MappedScheme};
pub use value::{encode_value, MappedValue};

use crate::error::DecodeError;
use crate::limits::DEFAULT_MAX_DEPTH;

/// Options for decoding a top-level value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest nesting accepted by strict validation.
    pub max_depth: usize,
    /// Decode the whole tree up front and reject trailing bytes.
    ///
    /// When disabled, only the outer header is read and children are decoded
    /// on first access.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl DecodeOptions {
    /// Creates lazy, lenient decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that validate the whole input eagerly.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Wraps `buf` as a [`MappedValue`] with default (lazy) options.
pub fn decode_value(buf: &[u8]) -> Result<MappedValue<'_>, DecodeError> {
    decode_value_with_options(buf, DecodeOptions::default())
}

/// Wraps `buf` as a [`MappedValue`].
///
/// In strict mode every child is decoded, children must exactly fill their
/// parents, and no bytes may follow the value.
pub fn decode_value_with_options(
    buf: &[u8],
    options: DecodeOptions,
) -> Result<MappedValue<'_>, DecodeError> {
    let (value, consumed) = MappedValue::decode_prefix(buf)?;
    if options.strict {
        if consumed != buf.len() {
            log::debug!("{} bytes follow the top-level value", buf.len() - consumed);
            return Err(DecodeError::TrailingBytes {
                context: "value",
                count: buf.len() - consumed,
            });
        }
        value.validate(options.max_depth)?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Value, ValueView};

    #[test]
    fn test_lenient_ignores_trailing() {
        let value = decode_value(&[0x01, 0x01, b'a', 0x00]).unwrap();
        assert_eq!(value.scalar(), Some(&b"a"[..]));
    }

    #[test]
    fn test_strict_rejects_trailing() {
        let err = decode_value_with_options(&[0x01, 0x01, b'a', 0x00], DecodeOptions::strict())
            .unwrap_err();
        assert_eq!(err, DecodeError::TrailingBytes { context: "value", count: 1 });
    }

    #[test]
    fn test_strict_finds_corrupt_children_up_front() {
        // Second child has a reserved content-length code.
        let bytes = [0x41, 0x02, 0x02, 0x00, 0x03];
        assert!(decode_value(&bytes).is_ok());
        let err = decode_value_with_options(&bytes, DecodeOptions::strict()).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptChild { index: 1, .. }));
    }

    #[test]
    fn test_strict_depth_limit() {
        let nested = Value::array_from([Value::array_from([Value::scalar(b"x".to_vec())])]);
        let bytes = encode_value(&nested).unwrap();

        let options = DecodeOptions::strict().with_max_depth(1);
        assert!(decode_value_with_options(&bytes, options).is_err());

        let value = decode_value_with_options(&bytes, DecodeOptions::strict()).unwrap();
        assert_eq!(value.count(), 1);
    }
}
