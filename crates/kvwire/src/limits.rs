//! Wire-format constants and decoding limits.

/// Maximum bytes in an unsigned varint (enough for a full u64).
pub const MAX_VARINT_BYTES: usize = 10;

/// Maximum scalar payload length (two-byte length field).
pub const MAX_SCALAR_LEN: usize = u16::MAX as usize;

/// Maximum encoded content length of any value.
pub const MAX_CONTENT_LEN: usize = u16::MAX as usize;

/// Maximum elements in an array or record list (two-byte count field).
pub const MAX_ELEMENTS: usize = u16::MAX as usize;

/// Maximum length of a record key, value or scheme field.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Length of a record timestamp (big-endian i64 nanoseconds).
pub const TIMESTAMP_LEN: usize = 8;

/// Length of each signature component (r and s).
pub const SIGNATURE_PART_LEN: usize = 32;

/// Length of a full record signature.
pub const SIGNATURE_LEN: usize = 2 * SIGNATURE_PART_LEN;

/// Default maximum nesting depth for eager validation and copy-construct.
pub const DEFAULT_MAX_DEPTH: usize = 64;
