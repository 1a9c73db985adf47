//! Key encoding/decoding.
//!
//! ```text
//! key := uvarint(count) varchar(sub_key)*
//! ```
//!
//! The empty key is the single byte `0x00`. An empty buffer also reads as
//! the empty key.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;

use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::model::{compare_keys, key_hash, keys_equal, Key, KeyView};

/// A key decoded in place over a borrowed buffer.
///
/// Framing is validated on construction. Sub-key slices are collected on
/// first access and point into the original buffer.
#[derive(Debug, Clone)]
pub struct MappedKey<'a> {
    buf: &'a [u8],
    count: usize,
    body: &'a [u8],
    sub_keys: OnceCell<Vec<&'a [u8]>>,
}

fn malformed(sub_key: usize, reason: &'static str) -> DecodeError {
    DecodeError::MalformedKey { sub_key, reason }
}

impl<'a> MappedKey<'a> {
    /// Wraps a buffer holding exactly one key.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let (key, consumed) = Self::decode_prefix(buf)?;
        if consumed != buf.len() {
            return Err(malformed(key.count, "trailing bytes"));
        }
        Ok(key)
    }

    /// Wraps the key at the start of `buf` and returns its encoded length.
    pub fn decode_prefix(buf: &'a [u8]) -> Result<(Self, usize), DecodeError> {
        if buf.is_empty() {
            return Ok((Self::empty(buf), 0));
        }

        let mut reader = Reader::new(buf);
        let count = reader
            .read_varint("key count")
            .map_err(|_| malformed(0, "malformed sub-key count"))?;
        // Every sub-key takes at least a length byte and one content byte.
        let count = usize::try_from(count)
            .ok()
            .filter(|count| *count <= reader.remaining_len() / 2)
            .ok_or_else(|| malformed(0, "sub-key count exceeds buffer"))?;

        let body_start = reader.position();
        for index in 0..count {
            let sub_key = reader.read_varchar("sub-key").map_err(|err| match err {
                DecodeError::MalformedVarint { .. } => malformed(index, "malformed sub-key length"),
                _ => malformed(index, "sub-key exceeds buffer"),
            })?;
            if sub_key.is_empty() {
                return Err(malformed(index, "empty sub-key"));
            }
        }

        let consumed = reader.position();
        Ok((
            Self {
                buf: &buf[..consumed],
                count,
                body: &buf[body_start..consumed],
                sub_keys: OnceCell::new(),
            },
            consumed,
        ))
    }

    fn empty(buf: &'a [u8]) -> Self {
        Self {
            buf,
            count: 0,
            body: buf,
            sub_keys: OnceCell::new(),
        }
    }

    /// Returns exactly the bytes of this key.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    pub fn encoded_len(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn slices(&self) -> &[&'a [u8]] {
        self.sub_keys.get_or_init(|| {
            let mut reader = Reader::new(self.body);
            let mut slices = Vec::with_capacity(self.count);
            // Framing was validated in decode_prefix.
            for _ in 0..self.count {
                match reader.read_varchar("sub-key") {
                    Ok(sub_key) => slices.push(sub_key),
                    Err(_) => break,
                }
            }
            slices
        })
    }

    /// Iterates over the sub-keys, borrowed from the input buffer.
    pub fn sub_keys(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.slices().iter().copied()
    }

    /// Copies this key into a constructed [`Key`].
    pub fn to_key(&self) -> Key {
        let mut key = Key::new();
        for sub_key in self.sub_keys() {
            // Sub-keys were checked to be non-empty on decode.
            if key.push(sub_key).is_err() {
                break;
            }
        }
        key
    }
}

impl KeyView for MappedKey<'_> {
    fn sub_key_count(&self) -> usize {
        self.count
    }

    fn sub_key(&self, index: usize) -> Option<&[u8]> {
        self.slices().get(index).copied()
    }
}

impl PartialEq for MappedKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        keys_equal(self, other)
    }
}

impl Eq for MappedKey<'_> {}

impl PartialOrd for MappedKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MappedKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(self, other)
    }
}

impl Hash for MappedKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(key_hash(self));
    }
}

impl PartialEq<Key> for MappedKey<'_> {
    fn eq(&self, other: &Key) -> bool {
        keys_equal(self, other)
    }
}

impl PartialEq<MappedKey<'_>> for Key {
    fn eq(&self, other: &MappedKey<'_>) -> bool {
        keys_equal(self, other)
    }
}

impl PartialOrd<Key> for MappedKey<'_> {
    fn partial_cmp(&self, other: &Key) -> Option<Ordering> {
        Some(compare_keys(self, other))
    }
}

impl PartialOrd<MappedKey<'_>> for Key {
    fn partial_cmp(&self, other: &MappedKey<'_>) -> Option<Ordering> {
        Some(compare_keys(self, other))
    }
}

/// Encodes a constructed key.
pub fn encode_key(key: &Key) -> Vec<u8> {
    let mut writer = Writer::new();
    writer.write_varint(key.len() as u64);
    for sub_key in key.sub_keys() {
        writer.write_varchar(sub_key);
    }
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;
    use crate::error::ErrorKind;

    fn key(parts: &[&str]) -> Key {
        Key::from_sub_keys(parts.iter().map(|p| p.as_bytes())).unwrap()
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(encode_key(&Key::new()), vec![0x00]);

        let zero = MappedKey::new(&[0x00]).unwrap();
        let nothing = MappedKey::new(&[]).unwrap();
        assert!(zero.is_empty());
        assert!(nothing.is_empty());
        assert_eq!(zero, nothing);
        assert_eq!(zero, Key::new());
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(
            encode_key(&key(&["ab", "c"])),
            vec![0x02, 0x02, b'a', b'b', 0x01, b'c']
        );
    }

    #[test]
    fn test_mapped_sub_keys_borrow_input() {
        let bytes = encode_key(&key(&["users", "42"]));
        let mapped = MappedKey::new(&bytes).unwrap();
        let parts: Vec<&[u8]> = mapped.sub_keys().collect();
        assert_eq!(parts, vec![&b"users"[..], &b"42"[..]]);
        assert_eq!(parts[0].as_ptr(), bytes[2..].as_ptr());
    }

    #[test]
    fn test_mapped_matches_constructed() {
        let constructed = key(&["a", "bc"]);
        let bytes = encode_key(&constructed);
        let mapped = MappedKey::new(&bytes).unwrap();

        assert_eq!(mapped, constructed);
        assert_eq!(constructed, mapped);
        assert_eq!(hash_of(&mapped), hash_of(&constructed));
        assert_eq!(mapped.to_key(), constructed);
        assert!(mapped < key(&["b"]));
        assert!(key(&["a"]) < mapped);
    }

    #[test]
    fn test_count_exceeds_buffer() {
        let err = MappedKey::new(&[0x05, 0x01, b'a']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedKey);
    }

    #[test]
    fn test_truncated_sub_key() {
        let err = MappedKey::new(&[0x02, 0x01, b'a', 0x05, b'b']).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedKey {
                sub_key: 1,
                reason: "sub-key exceeds buffer"
            }
        );
    }

    #[test]
    fn test_empty_sub_key_rejected() {
        let err = MappedKey::new(&[0x01, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedKey {
                sub_key: 0,
                reason: "empty sub-key"
            }
        );
    }

    #[test]
    fn test_trailing_bytes() {
        assert!(MappedKey::new(&[0x01, 0x01, b'a', 0xFF]).is_err());

        let (mapped, len) = MappedKey::decode_prefix(&[0x01, 0x01, b'a', 0xFF]).unwrap();
        assert_eq!(len, 3);
        assert_eq!(mapped.buf(), &[0x01, 0x01, b'a']);
    }

    #[test]
    fn test_malformed_count_varint() {
        let err = MappedKey::new(&[0x80]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedKey);
    }
}
