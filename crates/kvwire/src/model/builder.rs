//! Builder API for nested value construction.
//!
//! # Example
//!
//! ```rust
//! use kvwire::model::builder::ValueBuilder;
//! use kvwire::{Record, ValueView};
//!
//! let value = ValueBuilder::new()
//!     .scalar("alice")
//!     .array(|a| a.scalar("x").absent())
//!     .records(|r| r.record(Record::new().with_key_bytes("k")))
//!     .build();
//!
//! assert_eq!(value.count(), 3);
//! ```

use crate::model::{Record, Value};

/// Builder for an array value.
#[derive(Debug, Clone, Default)]
pub struct ValueBuilder {
    elements: Vec<Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scalar element.
    pub fn scalar(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.elements.push(Value::scalar(bytes));
        self
    }

    /// Appends an absent element.
    pub fn absent(mut self) -> Self {
        self.elements.push(Value::absent());
        self
    }

    /// Appends an already-built element.
    pub fn value(mut self, value: Value) -> Self {
        self.elements.push(value);
        self
    }

    /// Appends a nested array built by `f`.
    pub fn array<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ValueBuilder) -> ValueBuilder,
    {
        self.elements.push(f(ValueBuilder::new()).build());
        self
    }

    /// Appends a nested record list built by `f`.
    pub fn records<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RecordListBuilder) -> RecordListBuilder,
    {
        self.elements.push(f(RecordListBuilder::new()).build());
        self
    }

    /// Builds the array.
    pub fn build(self) -> Value {
        Value::array_from(self.elements)
    }
}

/// Builder for a record-list value.
#[derive(Debug, Clone, Default)]
pub struct RecordListBuilder {
    records: Vec<Record>,
}

impl RecordListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Builds the record list.
    pub fn build(self) -> Value {
        Value::record_list_from(self.records)
    }
}
