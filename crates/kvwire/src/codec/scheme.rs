//! Scheme encoding/decoding.
//!
//! ```text
//! scheme := flags [varchar(domain)] [varchar(tablet)] [uvarint(n) varchar(bucket)*n]
//! flags  := [domain:1][tablet:1][buckets:1][reserved:5]
//! ```

use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::model::Scheme;

const DOMAIN_FLAG: u8 = 0x80;
const TABLET_FLAG: u8 = 0x40;
const BUCKETS_FLAG: u8 = 0x20;
const RESERVED_MASK: u8 = 0x1F;

/// A scheme decoded over a borrowed buffer.
///
/// Schemes are small, so every field is located on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedScheme<'a> {
    buf: &'a [u8],
    domain: Option<&'a [u8]>,
    tablet: Option<&'a [u8]>,
    buckets: Option<Vec<&'a [u8]>>,
}

impl<'a> MappedScheme<'a> {
    /// Wraps a buffer holding exactly one scheme.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let (scheme, consumed) = Self::decode_prefix(buf)?;
        if consumed != buf.len() {
            return Err(DecodeError::TrailingBytes {
                context: "scheme",
                count: buf.len() - consumed,
            });
        }
        Ok(scheme)
    }

    /// Wraps the scheme at the start of `buf` and returns its encoded length.
    pub fn decode_prefix(buf: &'a [u8]) -> Result<(Self, usize), DecodeError> {
        let mut reader = Reader::new(buf);
        let flags = reader.read_byte("scheme header")?;
        if flags & RESERVED_MASK != 0 {
            return Err(DecodeError::ReservedBitsSet {
                context: "scheme",
                header: flags,
            });
        }

        let domain = if flags & DOMAIN_FLAG != 0 {
            Some(reader.read_varchar("domain")?)
        } else {
            None
        };
        let tablet = if flags & TABLET_FLAG != 0 {
            Some(reader.read_varchar("tablet")?)
        } else {
            None
        };
        let buckets = if flags & BUCKETS_FLAG != 0 {
            let count = reader.read_varint("bucket count")?;
            let available = reader.remaining_len();
            let count = usize::try_from(count)
                .ok()
                .filter(|count| *count <= available)
                .ok_or(DecodeError::TruncatedBuffer {
                    context: "bucket count",
                    needed: usize::try_from(count).unwrap_or(usize::MAX),
                    available,
                })?;
            let mut buckets = Vec::with_capacity(count);
            for _ in 0..count {
                buckets.push(reader.read_varchar("bucket")?);
            }
            Some(buckets)
        } else {
            None
        };

        let consumed = reader.position();
        Ok((
            Self {
                buf: &buf[..consumed],
                domain,
                tablet,
                buckets,
            },
            consumed,
        ))
    }

    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    pub fn encoded_len(&self) -> usize {
        self.buf.len()
    }

    pub fn domain(&self) -> Option<&'a [u8]> {
        self.domain
    }

    pub fn tablet(&self) -> Option<&'a [u8]> {
        self.tablet
    }

    pub fn buckets(&self) -> Option<&[&'a [u8]]> {
        self.buckets.as_deref()
    }

    /// Copies this scheme into a constructed [`Scheme`].
    pub fn to_scheme(&self) -> Scheme {
        let mut scheme = Scheme::new();
        scheme.set_domain(self.domain.map(<[u8]>::to_vec));
        scheme.set_tablet(self.tablet.map(<[u8]>::to_vec));
        scheme.set_buckets(
            self.buckets
                .as_ref()
                .map(|buckets| buckets.iter().map(|bucket| bucket.to_vec()).collect()),
        );
        scheme
    }
}

/// Encodes a constructed scheme.
pub fn encode_scheme(scheme: &Scheme) -> Vec<u8> {
    let mut flags = 0;
    if scheme.domain().is_some() {
        flags |= DOMAIN_FLAG;
    }
    if scheme.tablet().is_some() {
        flags |= TABLET_FLAG;
    }
    if scheme.buckets().is_some() {
        flags |= BUCKETS_FLAG;
    }

    let mut writer = Writer::new();
    writer.write_byte(flags);
    if let Some(domain) = scheme.domain() {
        writer.write_varchar(domain);
    }
    if let Some(tablet) = scheme.tablet() {
        writer.write_varchar(tablet);
    }
    if let Some(buckets) = scheme.buckets() {
        writer.write_varint(buckets.len() as u64);
        for bucket in buckets {
            writer.write_varchar(bucket);
        }
    }
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_scheme() {
        assert_eq!(encode_scheme(&Scheme::new()), vec![0x00]);
        let mapped = MappedScheme::new(&[0x00]).unwrap();
        assert_eq!(mapped.domain(), None);
        assert_eq!(mapped.tablet(), None);
        assert_eq!(mapped.buckets(), None);
    }

    #[test]
    fn test_full_layout() {
        let scheme = Scheme::new()
            .with_domain(b"eu".to_vec())
            .with_tablet(b"t1".to_vec())
            .with_buckets([b"a".to_vec(), b"bc".to_vec()]);
        let bytes = encode_scheme(&scheme);
        assert_eq!(
            bytes,
            [0xE0, 0x02, b'e', b'u', 0x02, b't', b'1', 0x02, 0x01, b'a', 0x02, b'b', b'c']
        );

        let mapped = MappedScheme::new(&bytes).unwrap();
        assert_eq!(mapped.buckets(), Some(&[&b"a"[..], &b"bc"[..]][..]));
        assert_eq!(mapped.to_scheme(), scheme);
    }

    #[test]
    fn test_flags_are_independent() {
        // Tablet only: other flags must not be inferred from a nonzero byte.
        let mapped = MappedScheme::new(&[0x40, 0x01, b'x']).unwrap();
        assert_eq!(mapped.domain(), None);
        assert_eq!(mapped.tablet(), Some(&b"x"[..]));
        assert_eq!(mapped.buckets(), None);
    }

    #[test]
    fn test_present_but_empty_fields() {
        let scheme = Scheme::new()
            .with_domain(Vec::new())
            .with_buckets(Vec::<Vec<u8>>::new());
        let bytes = encode_scheme(&scheme);
        assert_eq!(bytes, [0xA0, 0x00, 0x00]);
        assert_eq!(MappedScheme::new(&bytes).unwrap().to_scheme(), scheme);
    }

    #[test]
    fn test_reserved_bits() {
        let err = MappedScheme::new(&[0x01]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    }

    #[test]
    fn test_bucket_count_exceeds_buffer() {
        let err = MappedScheme::new(&[0x20, 0x09, 0x01, b'a']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer);
    }

    #[test]
    fn test_trailing_and_empty_input() {
        assert!(matches!(
            MappedScheme::new(&[0x00, 0x00]),
            Err(DecodeError::TrailingBytes { context: "scheme", count: 1 })
        ));
        assert_eq!(
            MappedScheme::new(&[]).unwrap_err().kind(),
            ErrorKind::TruncatedBuffer
        );
    }
}
