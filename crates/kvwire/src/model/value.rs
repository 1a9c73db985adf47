//! Constructed values.
//!
//! A [`Value`] is built in memory and encoded on demand. Its mapped
//! counterpart is [`crate::codec::MappedValue`]; both implement
//! [`ValueView`].

use crate::codec::value::encode_value;
use crate::error::EncodeError;
use crate::model::encoded::EncodedBuf;
use crate::model::record::Record;

/// The active variant of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// No content.
    Absent,
    /// Opaque bytes.
    Scalar,
    /// Ordered nested values.
    Array,
    /// Ordered nested records.
    RecordList,
}

/// Read-only access shared by mapped and constructed values.
pub trait ValueView {
    /// Returns the active variant.
    fn kind(&self) -> Kind;

    /// Returns the number of children (zero for absent and scalar values).
    fn count(&self) -> usize;

    /// Returns the scalar payload, or `None` if this is not a scalar.
    fn scalar_bytes(&self) -> Option<&[u8]>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Content {
    #[default]
    Absent,
    Scalar(Vec<u8>),
    Array(Vec<Value>),
    RecordList(Vec<Record>),
}

/// A value built in memory.
///
/// Mutations invalidate the buffer cached by [`Value::encode`]; call it
/// again before reading [`Value::buf`].
#[derive(Debug, Clone, Default)]
pub struct Value {
    content: Content,
    encoded: EncodedBuf,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for Value {}

impl Value {
    /// Creates an absent value.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Creates a scalar value.
    pub fn scalar(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_content(Content::Scalar(bytes.into()))
    }

    /// Creates an empty array.
    pub fn array() -> Self {
        Self::from_content(Content::Array(Vec::new()))
    }

    /// Creates an array from values.
    pub fn array_from(values: impl IntoIterator<Item = Value>) -> Self {
        Self::from_content(Content::Array(values.into_iter().collect()))
    }

    /// Creates an empty record list.
    pub fn record_list() -> Self {
        Self::from_content(Content::RecordList(Vec::new()))
    }

    /// Creates a record list from records.
    pub fn record_list_from(records: impl IntoIterator<Item = Record>) -> Self {
        Self::from_content(Content::RecordList(records.into_iter().collect()))
    }

    fn from_content(content: Content) -> Self {
        Self {
            content,
            encoded: EncodedBuf::default(),
        }
    }

    /// Returns the scalar payload if this is a scalar.
    pub fn as_scalar(&self) -> Option<&[u8]> {
        match &self.content {
            Content::Scalar(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match &self.content {
            Content::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the records if this is a record list.
    pub fn as_records(&self) -> Option<&[Record]> {
        match &self.content {
            Content::RecordList(records) => Some(records),
            _ => None,
        }
    }

    /// Returns the array element at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    /// Returns the record at `index`.
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.as_records()?.get(index)
    }

    /// Returns a mutable array element, invalidating this value's buffer.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.encoded.invalidate();
        match &mut self.content {
            Content::Array(values) => values.get_mut(index),
            _ => None,
        }
    }

    /// Returns a mutable record, invalidating this value's buffer.
    pub fn record_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.encoded.invalidate();
        match &mut self.content {
            Content::RecordList(records) => records.get_mut(index),
            _ => None,
        }
    }

    /// Replaces the content with a scalar, whatever the current kind.
    pub fn set_scalar(&mut self, bytes: impl Into<Vec<u8>>) {
        self.encoded.invalidate();
        self.content = Content::Scalar(bytes.into());
    }

    /// Replaces the content with nothing.
    pub fn clear(&mut self) {
        self.encoded.invalidate();
        self.content = Content::Absent;
    }

    /// Appends an element to an array.
    pub fn push_value(&mut self, value: Value) -> Result<(), EncodeError> {
        if let Content::Array(values) = &mut self.content {
            self.encoded.invalidate();
            values.push(value);
            return Ok(());
        }
        Err(EncodeError::WrongKind {
            expected: Kind::Array,
            found: self.kind(),
        })
    }

    /// Appends a record to a record list.
    pub fn push_record(&mut self, record: Record) -> Result<(), EncodeError> {
        if let Content::RecordList(records) = &mut self.content {
            self.encoded.invalidate();
            records.push(record);
            return Ok(());
        }
        Err(EncodeError::WrongKind {
            expected: Kind::RecordList,
            found: self.kind(),
        })
    }

    /// Returns true if this value is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self.content, Content::Absent)
    }

    /// Encodes the value and caches the buffer.
    pub fn encode(&mut self) -> Result<&[u8], EncodeError> {
        let bytes = encode_value(self)?;
        Ok(self.encoded.store(bytes))
    }

    /// Returns the buffer from the last [`Value::encode`].
    ///
    /// Fails with `NotEncoded` if the value was never encoded or has been
    /// mutated since.
    pub fn buf(&self) -> Result<&[u8], EncodeError> {
        self.encoded.get("value")
    }

    /// Returns true if a current encoded buffer is cached.
    pub fn is_encoded(&self) -> bool {
        self.encoded.is_encoded()
    }

    /// Encodes the value into a new buffer without touching the cache.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_value(self)
    }
}

impl ValueView for Value {
    fn kind(&self) -> Kind {
        match self.content {
            Content::Absent => Kind::Absent,
            Content::Scalar(_) => Kind::Scalar,
            Content::Array(_) => Kind::Array,
            Content::RecordList(_) => Kind::RecordList,
        }
    }

    fn count(&self) -> usize {
        match &self.content {
            Content::Absent | Content::Scalar(_) => 0,
            Content::Array(values) => values.len(),
            Content::RecordList(records) => records.len(),
        }
    }

    fn scalar_bytes(&self) -> Option<&[u8]> {
        self.as_scalar()
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::scalar(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::scalar(bytes)
    }
}
