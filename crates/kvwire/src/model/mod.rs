//! Constructed (in-memory) types.
//!
//! - Values (absent, scalar, array, record list)
//! - Keys (ordered sub-keys)
//! - Records (key, value, scheme, timestamp, signature)
//! - Schemes (domain, tablet, buckets)
//! - Builders (ergonomic nested construction)

pub mod builder;
mod encoded;
pub mod key;
pub mod record;
pub mod scheme;
pub mod value;

pub use builder::{RecordListBuilder, ValueBuilder};
pub use key::{compare_keys, key_hash, keys_equal, Key, KeyView};
pub use record::{Record, Signature};
pub use scheme::Scheme;
pub use value::{Kind, Value, ValueView};
