//! Lazily decoded children of an array or record list.
//!
//! Children are stored back to back without their own length prefix, so
//! child `i` starts where child `i - 1` ends. Each slot caches the decoded
//! child together with its end offset; slots fill strictly in order, which
//! keeps the offset of every decoded child available in O(1).

use once_cell::sync::OnceCell;

use crate::error::DecodeError;

#[derive(Debug, Clone)]
struct Slot<T> {
    end: usize,
    node: T,
}

/// Position-indexed cache of decoded children.
///
/// Slots are allocated on first access and initialized at most once, so a
/// table can be shared between threads.
#[derive(Debug, Clone)]
pub(crate) struct ChildTable<T> {
    count: usize,
    slots: OnceCell<Box<[OnceCell<Slot<T>>]>>,
}

impl<T> ChildTable<T> {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            count,
            slots: OnceCell::new(),
        }
    }

    /// Declared number of children.
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Returns child `index`, decoding it and any undecoded predecessors.
    pub(crate) fn get_or_decode<'a, F>(
        &self,
        content: &'a [u8],
        index: usize,
        decode: F,
    ) -> Result<&T, DecodeError>
    where
        F: Fn(&'a [u8]) -> Result<(T, usize), DecodeError>,
    {
        if index >= self.count {
            return Err(DecodeError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }

        let slots = self
            .slots
            .get_or_init(|| (0..self.count).map(|_| OnceCell::new()).collect());

        if let Some(slot) = slots.get(index).and_then(OnceCell::get) {
            return Ok(&slot.node);
        }

        let mut start = 0;
        let mut last = None;
        for (i, cell) in slots.iter().enumerate().take(index + 1) {
            let slot = cell.get_or_try_init(|| decode_slot(content, start, i, &decode))?;
            start = slot.end;
            last = Some(slot);
        }

        last.map(|slot| &slot.node).ok_or(DecodeError::IndexOutOfRange {
            index,
            count: self.count,
        })
    }

    /// End offset of child `index` within the content, if it is decoded.
    pub(crate) fn end_of(&self, index: usize) -> Option<usize> {
        self.slots.get()?.get(index)?.get().map(|slot| slot.end)
    }
}

fn decode_slot<'a, T, F>(
    content: &'a [u8],
    start: usize,
    index: usize,
    decode: &F,
) -> Result<Slot<T>, DecodeError>
where
    F: Fn(&'a [u8]) -> Result<(T, usize), DecodeError>,
{
    let rest = content.get(start..).filter(|rest| !rest.is_empty()).ok_or_else(|| {
        DecodeError::CorruptChild {
            index,
            source: Box::new(DecodeError::TruncatedBuffer {
                context: "child",
                needed: 1,
                available: 0,
            }),
        }
    })?;

    match decode(rest) {
        Ok((node, len)) => Ok(Slot {
            end: start + len,
            node,
        }),
        Err(err) => {
            log::debug!("child {} at offset {} failed to decode: {}", index, start, err);
            Err(DecodeError::CorruptChild {
                index,
                source: Box::new(err),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    // Children are single bytes holding their own length, e.g. [2, x] [1] [3, y, z].
    fn decode_len_prefixed(rest: &[u8]) -> Result<(u8, usize), DecodeError> {
        let len = rest[0] as usize;
        if len == 0 || len > rest.len() {
            return Err(DecodeError::TruncatedBuffer {
                context: "test child",
                needed: len,
                available: rest.len(),
            });
        }
        Ok((rest[0], len))
    }

    #[test]
    fn test_offsets_accumulate() {
        let content = [2, 0xAA, 1, 3, 0xBB, 0xCC];
        let table = ChildTable::new(3);

        assert_eq!(*table.get_or_decode(&content, 2, decode_len_prefixed).unwrap(), 3);
        assert_eq!(table.end_of(0), Some(2));
        assert_eq!(table.end_of(1), Some(3));
        assert_eq!(table.end_of(2), Some(6));
    }

    #[test]
    fn test_children_decode_once() {
        let content = [1, 1, 1];
        let table = ChildTable::new(3);
        let calls = Cell::new(0);
        let counting = |rest: &[u8]| {
            calls.set(calls.get() + 1);
            decode_len_prefixed(rest)
        };

        table.get_or_decode(&content, 1, &counting).unwrap();
        assert_eq!(calls.get(), 2);
        table.get_or_decode(&content, 0, &counting).unwrap();
        table.get_or_decode(&content, 1, &counting).unwrap();
        assert_eq!(calls.get(), 2);
        table.get_or_decode(&content, 2, &counting).unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_nothing_decoded_before_access() {
        let table: ChildTable<u8> = ChildTable::new(2);
        assert_eq!(table.end_of(0), None);
    }

    #[test]
    fn test_index_out_of_range() {
        let table: ChildTable<u8> = ChildTable::new(1);
        assert_eq!(
            table.get_or_decode(&[1], 1, decode_len_prefixed).unwrap_err(),
            DecodeError::IndexOutOfRange { index: 1, count: 1 }
        );
    }

    #[test]
    fn test_short_content_is_corrupt_child() {
        let table = ChildTable::new(2);
        let err = table.get_or_decode(&[1], 1, decode_len_prefixed).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptChild { index: 1, .. }));
    }

    #[test]
    fn test_decode_failure_is_corrupt_child() {
        let table = ChildTable::new(1);
        let err = table.get_or_decode(&[5, 0], 0, decode_len_prefixed).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptChild { index: 0, .. }));
        assert_eq!(table.end_of(0), None);
    }
}
