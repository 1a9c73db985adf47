//! Routing descriptors attached to records.

use crate::codec::scheme::encode_scheme;
use crate::error::EncodeError;
use crate::model::encoded::EncodedBuf;

/// A scheme built in memory: domain, tablet and bucket list, each optional.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    domain: Option<Vec<u8>>,
    tablet: Option<Vec<u8>>,
    buckets: Option<Vec<Vec<u8>>>,
    encoded: EncodedBuf,
}

impl PartialEq for Scheme {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.tablet == other.tablet && self.buckets == other.buckets
    }
}

impl Eq for Scheme {}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<Vec<u8>>) -> Self {
        self.set_domain(Some(domain.into()));
        self
    }

    pub fn with_tablet(mut self, tablet: impl Into<Vec<u8>>) -> Self {
        self.set_tablet(Some(tablet.into()));
        self
    }

    /// Appends a bucket, creating the bucket list if needed.
    pub fn with_bucket(mut self, bucket: impl Into<Vec<u8>>) -> Self {
        self.push_bucket(bucket);
        self
    }

    /// Replaces the bucket list.
    pub fn with_buckets<I, B>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.set_buckets(Some(buckets.into_iter().map(Into::into).collect()));
        self
    }

    pub fn set_domain(&mut self, domain: Option<Vec<u8>>) {
        self.encoded.invalidate();
        self.domain = domain;
    }

    pub fn set_tablet(&mut self, tablet: Option<Vec<u8>>) {
        self.encoded.invalidate();
        self.tablet = tablet;
    }

    pub fn set_buckets(&mut self, buckets: Option<Vec<Vec<u8>>>) {
        self.encoded.invalidate();
        self.buckets = buckets;
    }

    pub fn push_bucket(&mut self, bucket: impl Into<Vec<u8>>) {
        self.encoded.invalidate();
        self.buckets.get_or_insert_with(Vec::new).push(bucket.into());
    }

    pub fn domain(&self) -> Option<&[u8]> {
        self.domain.as_deref()
    }

    pub fn tablet(&self) -> Option<&[u8]> {
        self.tablet.as_deref()
    }

    pub fn buckets(&self) -> Option<&[Vec<u8>]> {
        self.buckets.as_deref()
    }

    /// Encodes the scheme and caches the buffer.
    pub fn encode(&mut self) -> &[u8] {
        let bytes = encode_scheme(self);
        self.encoded.store(bytes)
    }

    /// Returns the buffer from the last [`Scheme::encode`].
    pub fn buf(&self) -> Result<&[u8], EncodeError> {
        self.encoded.get("scheme")
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded.is_encoded()
    }

    /// Encodes the scheme into a new buffer without touching the cache.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_scheme(self)
    }
}
