//! Error types for kvwire encoding and decoding.

use thiserror::Error;

use crate::model::Kind;

/// Broad failure categories shared by decode and encode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A declared length or count exceeds the remaining bytes.
    TruncatedBuffer,
    /// A varint continuation sequence is invalid or truncated.
    MalformedVarint,
    /// A reserved code or an unimplemented extension was found.
    UnsupportedEncoding,
    /// Both the array and the record-list bit groups are set.
    ConflictingKind,
    /// Content does not fit the 16-bit length or count fields.
    ValueTooLarge,
    /// A child index is beyond the declared count.
    IndexOutOfRange,
    /// A nested child failed to decode.
    CorruptChild,
    /// A key buffer is malformed.
    MalformedKey,
    /// An encoded buffer was requested before `encode` was called.
    NotEncoded,
    /// The operation does not apply to this kind of value.
    WrongKind,
    /// Structurally invalid input not covered by a more specific kind.
    Malformed,
}

impl ErrorKind {
    /// Returns a short stable name for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TruncatedBuffer => "truncated-buffer",
            ErrorKind::MalformedVarint => "malformed-varint",
            ErrorKind::UnsupportedEncoding => "unsupported-encoding",
            ErrorKind::ConflictingKind => "conflicting-kind",
            ErrorKind::ValueTooLarge => "value-too-large",
            ErrorKind::IndexOutOfRange => "index-out-of-range",
            ErrorKind::CorruptChild => "corrupt-child",
            ErrorKind::MalformedKey => "malformed-key",
            ErrorKind::NotEncoded => "not-encoded",
            ErrorKind::WrongKind => "wrong-kind",
            ErrorKind::Malformed => "malformed",
        }
    }
}

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated buffer reading {context}: need {needed} bytes, {available} available")]
    TruncatedBuffer {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("malformed varint in {context}: {reason}")]
    MalformedVarint {
        context: &'static str,
        reason: &'static str,
    },

    #[error("unsupported encoding code {code} for {field}")]
    UnsupportedEncoding { field: &'static str, code: u8 },

    #[error("unsupported extension: {extension}")]
    UnsupportedExtension { extension: &'static str },

    #[error("header {header:#04x} sets both array and record-list sizes")]
    ConflictingKind { header: u8 },

    #[error("reserved bits set in {context} header {header:#04x}")]
    ReservedBitsSet { context: &'static str, header: u8 },

    #[error("index {index} out of range (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("child {index} is corrupt: {source}")]
    CorruptChild {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("invalid {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("malformed key at sub-key {sub_key}: {reason}")]
    MalformedKey { sub_key: usize, reason: &'static str },

    #[error("expected {expected:?} value, found {found:?}")]
    WrongKind { expected: Kind, found: Kind },

    #[error("{count} trailing bytes after {context}")]
    TrailingBytes { context: &'static str, count: usize },

    #[error("nesting exceeds maximum depth {max}")]
    NestingTooDeep { max: usize },
}

impl DecodeError {
    /// Returns the category of this error.
    ///
    /// `Field` wrappers report the category of their cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::TruncatedBuffer { .. } => ErrorKind::TruncatedBuffer,
            DecodeError::MalformedVarint { .. } => ErrorKind::MalformedVarint,
            DecodeError::UnsupportedEncoding { .. }
            | DecodeError::UnsupportedExtension { .. }
            | DecodeError::ReservedBitsSet { .. } => ErrorKind::UnsupportedEncoding,
            DecodeError::ConflictingKind { .. } => ErrorKind::ConflictingKind,
            DecodeError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            DecodeError::CorruptChild { .. } => ErrorKind::CorruptChild,
            DecodeError::Field { source, .. } => source.kind(),
            DecodeError::MalformedKey { .. } => ErrorKind::MalformedKey,
            DecodeError::WrongKind { .. } => ErrorKind::WrongKind,
            DecodeError::TrailingBytes { .. } | DecodeError::NestingTooDeep { .. } => {
                ErrorKind::Malformed
            }
        }
    }

    /// Wraps this error with the name of the field being decoded.
    pub(crate) fn in_field(self, field: &'static str) -> DecodeError {
        DecodeError::Field {
            field,
            source: Box::new(self),
        }
    }

    /// Follows `Field` and `CorruptChild` wrappers down to the original cause.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::Field { source, .. } | DecodeError::CorruptChild { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    ValueTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} has {len} elements, maximum is {max}")]
    TooManyElements {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{what} has not been encoded")]
    NotEncoded { what: &'static str },

    #[error("sub-key {index} is empty")]
    EmptySubKey { index: usize },

    #[error("expected {expected:?} value, found {found:?}")]
    WrongKind { expected: Kind, found: Kind },

    #[error("record has a signature but no timestamp")]
    SignatureWithoutTimestamp,

    #[error("record {index} is timestamped but unsigned and is not last in its list")]
    UnsignedRecordNotLast { index: usize },

    #[error("nesting exceeds maximum depth {max}")]
    NestingTooDeep { max: usize },
}

impl EncodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::ValueTooLarge { .. } | EncodeError::TooManyElements { .. } => {
                ErrorKind::ValueTooLarge
            }
            EncodeError::NotEncoded { .. } => ErrorKind::NotEncoded,
            EncodeError::EmptySubKey { .. } => ErrorKind::MalformedKey,
            EncodeError::WrongKind { .. } => ErrorKind::WrongKind,
            EncodeError::SignatureWithoutTimestamp
            | EncodeError::UnsignedRecordNotLast { .. }
            | EncodeError::NestingTooDeep { .. } => ErrorKind::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_reports_cause_kind() {
        let err = DecodeError::TruncatedBuffer {
            context: "timestamp",
            needed: 8,
            available: 3,
        }
        .in_field("record");
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer);
        assert!(err.to_string().contains("invalid record"));
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let inner = DecodeError::ConflictingKind { header: 0x55 };
        let err = DecodeError::CorruptChild {
            index: 2,
            source: Box::new(inner.clone().in_field("value")),
        };
        assert_eq!(err.kind(), ErrorKind::CorruptChild);
        assert_eq!(err.root_cause(), &inner);
    }

    #[test]
    fn test_extension_is_unsupported_encoding() {
        let err = DecodeError::UnsupportedExtension { extension: "lookup" };
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
        assert_eq!(err.kind().as_str(), "unsupported-encoding");
    }
}
