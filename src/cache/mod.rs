//! Cache Module
//!
//! Provides a PSR-16 style key-value cache with lazy TTL expiration.

mod entry;
mod key;
mod stats;
mod store;
mod value;


// Re-export public types
pub(crate) use entry::CacheRecord;
pub use key::{validate_key, RESERVED_KEY_CHARACTERS};
pub use stats::CacheStats;
pub use store::{CacheStore, TtlStore};
pub use value::{lifetime_of, CacheValue, Lifetime, Ttl};

pub use crate::error::Result;

// == Public Constants ==
/// Default maximum key length in bytes, the length of a hex SHA-1 digest
pub const DEFAULT_MAX_KEY_LENGTH: usize = 40;
