//! Cached output of the last `encode` call on a constructed object.

use crate::error::EncodeError;

/// Holds the buffer produced by the most recent encode.
///
/// Cleared by every mutation of the owning object, so a present buffer
/// always matches the current content.
#[derive(Debug, Clone, Default)]
pub(crate) struct EncodedBuf {
    bytes: Option<Vec<u8>>,
}

impl EncodedBuf {
    /// Returns the cached buffer, or `NotEncoded` if there is none.
    pub(crate) fn get(&self, what: &'static str) -> Result<&[u8], EncodeError> {
        self.bytes.as_deref().ok_or(EncodeError::NotEncoded { what })
    }

    /// Stores a freshly encoded buffer and returns it.
    pub(crate) fn store(&mut self, bytes: Vec<u8>) -> &[u8] {
        self.bytes.insert(bytes)
    }

    pub(crate) fn invalidate(&mut self) {
        self.bytes = None;
    }

    pub(crate) fn is_encoded(&self) -> bool {
        self.bytes.is_some()
    }
}
