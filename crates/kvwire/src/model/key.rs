//! Composite keys.
//!
//! A key is an ordered list of non-empty opaque sub-keys. Ordering is
//! lexicographic sub-key by sub-key, and a key that is a prefix of another
//! sorts first. Equality, ordering and hashing only look at sub-key content,
//! so a [`Key`] and a [`crate::codec::MappedKey`] with the same sub-keys are
//! interchangeable.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::codec::key::encode_key;
use crate::error::EncodeError;
use crate::model::encoded::EncodedBuf;

/// Read-only access shared by mapped and constructed keys.
pub trait KeyView {
    /// Returns the number of sub-keys.
    fn sub_key_count(&self) -> usize;

    /// Returns the sub-key at `index`.
    fn sub_key(&self, index: usize) -> Option<&[u8]>;

    /// Returns true if the key has no sub-keys.
    fn is_empty_key(&self) -> bool {
        self.sub_key_count() == 0
    }
}

/// Compares two keys sub-key by sub-key.
pub fn compare_keys<A, B>(a: &A, b: &B) -> Ordering
where
    A: KeyView + ?Sized,
    B: KeyView + ?Sized,
{
    let common = a.sub_key_count().min(b.sub_key_count());
    for i in 0..common {
        match a.sub_key(i).cmp(&b.sub_key(i)) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    a.sub_key_count().cmp(&b.sub_key_count())
}

/// Returns true if both keys hold the same sub-keys.
pub fn keys_equal<A, B>(a: &A, b: &B) -> bool
where
    A: KeyView + ?Sized,
    B: KeyView + ?Sized,
{
    a.sub_key_count() == b.sub_key_count() && compare_keys(a, b) == Ordering::Equal
}

/// XOR of the hashes of each sub-key.
///
/// The empty key hashes to zero.
pub fn key_hash<K: KeyView + ?Sized>(key: &K) -> u64 {
    (0..key.sub_key_count())
        .filter_map(|i| key.sub_key(i))
        .fold(0u64, |acc, sub_key| {
            let mut hasher = FxHasher::default();
            sub_key.hash(&mut hasher);
            acc ^ hasher.finish()
        })
}

/// A key built in memory.
#[derive(Debug, Clone, Default)]
pub struct Key {
    sub_keys: Vec<Vec<u8>>,
    encoded: EncodedBuf,
}

impl Key {
    /// Creates the empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a key from sub-keys, rejecting empty ones.
    pub fn from_sub_keys<I, S>(sub_keys: I) -> Result<Self, EncodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let mut key = Key::new();
        for sub_key in sub_keys {
            key.push(sub_key)?;
        }
        Ok(key)
    }

    /// Appends a sub-key.
    pub fn push(&mut self, sub_key: impl Into<Vec<u8>>) -> Result<(), EncodeError> {
        let sub_key = sub_key.into();
        if sub_key.is_empty() {
            return Err(EncodeError::EmptySubKey {
                index: self.sub_keys.len(),
            });
        }
        self.encoded.invalidate();
        self.sub_keys.push(sub_key);
        Ok(())
    }

    /// Appends a sub-key, consuming and returning the key.
    pub fn with(mut self, sub_key: impl Into<Vec<u8>>) -> Result<Self, EncodeError> {
        self.push(sub_key)?;
        Ok(self)
    }

    /// Iterates over the sub-keys.
    pub fn sub_keys(&self) -> impl Iterator<Item = &[u8]> {
        self.sub_keys.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.sub_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_keys.is_empty()
    }

    /// Encodes the key and caches the buffer.
    pub fn encode(&mut self) -> &[u8] {
        let bytes = encode_key(self);
        self.encoded.store(bytes)
    }

    /// Returns the buffer from the last [`Key::encode`].
    pub fn buf(&self) -> Result<&[u8], EncodeError> {
        self.encoded.get("key")
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded.is_encoded()
    }

    /// Encodes the key into a new buffer without touching the cache.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_key(self)
    }
}

impl KeyView for Key {
    fn sub_key_count(&self) -> usize {
        self.sub_keys.len()
    }

    fn sub_key(&self, index: usize) -> Option<&[u8]> {
        self.sub_keys.get(index).map(Vec::as_slice)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        keys_equal(self, other)
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(self, other)
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(key_hash(self));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use super::*;

    fn key(parts: &[&str]) -> Key {
        Key::from_sub_keys(parts.iter().map(|p| p.as_bytes())).unwrap()
    }

    #[test]
    fn test_empty_sub_key_rejected() {
        let mut k = key(&["a"]);
        assert_eq!(k.push(Vec::new()), Err(EncodeError::EmptySubKey { index: 1 }));
        assert_eq!(k.len(), 1);
    }

    #[test]
    fn test_ordering() {
        assert!(key(&["a"]) < key(&["b"]));
        assert!(key(&["a"]) < key(&["a", "a"]));
        assert!(key(&["ab"]) > key(&["a", "z"]));
        assert!(key(&[]) < key(&["a"]));
        assert_eq!(key(&["a", "b"]).cmp(&key(&["a", "b"])), Ordering::Equal);
    }

    #[test]
    fn test_empty_keys_equal() {
        assert_eq!(Key::new(), Key::new());
        assert_eq!(key_hash(&Key::new()), 0);
        assert_ne!(Key::new(), key(&["a"]));
    }

    #[test]
    fn test_sub_key_boundaries_matter() {
        // Same concatenated bytes, different sub-keys.
        assert_ne!(key(&["ab", "c"]), key(&["a", "bc"]));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(key(&["users", "1"]));
        assert!(set.contains(&key(&["users", "1"])));
        assert!(!set.contains(&key(&["users", "2"])));
    }

    #[test]
    fn test_btree_ordering() {
        let mut map = BTreeMap::new();
        map.insert(key(&["b"]), 2);
        map.insert(key(&["a", "z"]), 1);
        map.insert(key(&["a"]), 0);
        let order: Vec<_> = map.values().copied().collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_encode_cache() {
        let mut k = key(&["a"]);
        assert!(k.buf().is_err());
        assert_eq!(k.encode(), &[0x01, 0x01, b'a']);
        assert_eq!(k.buf().unwrap(), &[0x01, 0x01, b'a']);
        k.push(b"b".to_vec()).unwrap();
        assert!(!k.is_encoded());
    }
}
