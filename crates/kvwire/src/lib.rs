//! kvwire: self-describing nested binary values for key-value storage.
//!
//! This crate provides encoding and lazy decoding for the values, keys,
//! records and schemes that a key-value platform stores in its tables and
//! sends over the network.
//!
//! # Overview
//!
//! Every type comes in two forms:
//! - **Constructed** ([`Value`], [`Key`], [`Record`], [`Scheme`]): built in
//!   memory, encoded on demand, mutable
//! - **Mapped** ([`MappedValue`], [`MappedKey`], [`MappedRecord`],
//!   [`MappedScheme`]): read-only views over a borrowed buffer that decode
//!   nested children on first access and never copy content bytes
//!
//! Both forms of the same logical content produce identical bytes.
//!
//! # Quick Start
//!
//! ```rust
//! use kvwire::{decode_value, Key, Kind, Record, Value, ValueView};
//!
//! let key = Key::from_sub_keys([b"users".to_vec(), b"42".to_vec()]).unwrap();
//! let record = Record::new()
//!     .with_key(&key)
//!     .with_value(&Value::scalar(b"alice".to_vec()))
//!     .unwrap()
//!     .with_timestamp(1_700_000_000_000_000_000);
//!
//! let mut value = Value::record_list_from([record]);
//! let bytes = value.encode().unwrap().to_vec();
//!
//! // Only the outer header is read here.
//! let mapped = decode_value(&bytes).unwrap();
//! assert_eq!(mapped.kind(), Kind::RecordList);
//!
//! // The record is decoded on first access.
//! let first = mapped.record_at(0).unwrap();
//! assert_eq!(first.key_as_key().unwrap().unwrap(), key);
//! assert_eq!(first.timestamp(), Some(1_700_000_000_000_000_000));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Constructed types and the [`ValueView`] / [`KeyView`] traits
//! - [`codec`]: Mapped types, encoders and wire primitives
//! - [`digest`]: SHA-256 content hashes of encoded buffers
//! - [`error`]: Error types
//! - [`limits`]: Wire limits
//!
//! # Security
//!
//! Decoding is safe on untrusted input:
//! - Every length and count is checked against the remaining bytes
//! - Varints are limited to 10 bytes
//! - Reserved codes and unimplemented extensions are rejected
//! - Strict decoding bounds nesting depth (see [`DecodeOptions`])
//!
//! # Wire Format
//!
//! A value starts with one header byte:
//!
//! ```text
//! [array-size:2][recordlist-size:2][lookup:1][compression:1][content-length:2]
//! ```
//!
//! Each two-bit code is 0 (absent), 1 (one byte) or 2 (two bytes,
//! big-endian). The optional count and content length follow, then the
//! content: raw bytes for a scalar, or the concatenated encodings of the
//! children of an array or record list.

pub mod codec;
pub mod digest;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{
    decode_value, decode_value_with_options, encode_key, encode_record, encode_scheme,
    encode_value, DecodeOptions, MappedKey, MappedRecord, MappedScheme, MappedValue,
};
pub use digest::{content_hash, format_hash, ContentHash};
pub use error::{DecodeError, EncodeError, ErrorKind};
pub use model::{
    compare_keys, key_hash, keys_equal, Key, KeyView, Kind, Record, RecordListBuilder, Scheme,
    Signature, Value, ValueBuilder, ValueView,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
