//! Constructed records.
//!
//! A record carries up to five fields: key, value and scheme regions (each
//! opaque bytes on the wire, usually holding an encoded [`Key`], [`Value`]
//! or [`Scheme`]), a nanosecond timestamp and an optional signature.

use crate::codec::record::encode_record;
use crate::digest::{content_hash, ContentHash};
use crate::error::EncodeError;
use crate::limits::SIGNATURE_PART_LEN;
use crate::model::encoded::EncodedBuf;
use crate::model::{Key, Scheme, Value};

/// Record signature: two 32-byte big-endian unsigned integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub r: [u8; SIGNATURE_PART_LEN],
    pub s: [u8; SIGNATURE_PART_LEN],
}

impl Signature {
    pub fn new(r: [u8; SIGNATURE_PART_LEN], s: [u8; SIGNATURE_PART_LEN]) -> Self {
        Self { r, s }
    }
}

/// A record built in memory.
#[derive(Debug, Clone, Default)]
pub struct Record {
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
    scheme: Option<Vec<u8>>,
    /// Nanoseconds since the Unix epoch.
    timestamp: Option<i64>,
    signature: Option<Signature>,
    encoded: EncodedBuf,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.scheme == other.scheme
            && self.timestamp == other.timestamp
            && self.signature == other.signature
    }
}

impl Eq for Record {}

impl Record {
    /// Creates a record with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Fluent construction
    // =========================================================================

    /// Sets the key region to raw bytes.
    pub fn with_key_bytes(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.set_key_bytes(key);
        self
    }

    /// Sets the key region to an encoded key.
    pub fn with_key(mut self, key: &Key) -> Self {
        self.set_key_bytes(key.to_bytes());
        self
    }

    /// Sets the value region to raw bytes.
    pub fn with_value_bytes(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.set_value_bytes(value);
        self
    }

    /// Sets the value region to an encoded value.
    pub fn with_value(mut self, value: &Value) -> Result<Self, EncodeError> {
        self.set_value_bytes(value.to_bytes()?);
        Ok(self)
    }

    /// Sets the scheme region to raw bytes.
    pub fn with_scheme_bytes(mut self, scheme: impl Into<Vec<u8>>) -> Self {
        self.set_scheme_bytes(scheme);
        self
    }

    /// Sets the scheme region to an encoded scheme.
    pub fn with_scheme(mut self, scheme: &Scheme) -> Self {
        self.set_scheme_bytes(scheme.to_bytes());
        self
    }

    /// Sets the timestamp (nanoseconds since the Unix epoch).
    pub fn with_timestamp(mut self, nanos: i64) -> Self {
        self.set_timestamp(Some(nanos));
        self
    }

    /// Sets the signature. Encoding also requires a timestamp.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.set_signature(Some(signature));
        self
    }

    // =========================================================================
    // Setters
    // =========================================================================

    pub fn set_key_bytes(&mut self, key: impl Into<Vec<u8>>) {
        self.encoded.invalidate();
        self.key = Some(key.into());
    }

    pub fn set_value_bytes(&mut self, value: impl Into<Vec<u8>>) {
        self.encoded.invalidate();
        self.value = Some(value.into());
    }

    pub fn set_scheme_bytes(&mut self, scheme: impl Into<Vec<u8>>) {
        self.encoded.invalidate();
        self.scheme = Some(scheme.into());
    }

    pub fn set_timestamp(&mut self, nanos: Option<i64>) {
        self.encoded.invalidate();
        self.timestamp = nanos;
    }

    pub fn set_signature(&mut self, signature: Option<Signature>) {
        self.encoded.invalidate();
        self.signature = signature;
    }

    /// Removes the key, value and scheme regions.
    pub fn clear_fields(&mut self) {
        self.encoded.invalidate();
        self.key = None;
        self.value = None;
        self.scheme = None;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn scheme(&self) -> Option<&[u8]> {
        self.scheme.as_deref()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encodes the record and caches the buffer.
    pub fn encode(&mut self) -> Result<&[u8], EncodeError> {
        let bytes = encode_record(self)?;
        Ok(self.encoded.store(bytes))
    }

    /// Returns the buffer from the last [`Record::encode`].
    pub fn buf(&self) -> Result<&[u8], EncodeError> {
        self.encoded.get("record")
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded.is_encoded()
    }

    /// Encodes the record into a new buffer without touching the cache.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_record(self)
    }

    /// SHA-256 of the encoded record.
    pub fn content_hash(&self) -> Result<ContentHash, EncodeError> {
        match self.buf() {
            Ok(buf) => Ok(content_hash(buf)),
            Err(_) => Ok(content_hash(&self.to_bytes()?)),
        }
    }
}
