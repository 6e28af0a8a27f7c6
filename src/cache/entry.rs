//! Cache Record Module
//!
//! Defines the structure for individual cache records with TTL support.

use chrono::{DateTime, Utc};

use crate::cache::CacheValue;

// == Cache Record ==
/// Represents a single cache record with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    /// The stored value
    pub value: CacheValue,
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a new record created at `now`.
    pub fn new(value: CacheValue, now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the record has expired at `now`.
    ///
    /// A record is expired once `now` reaches its expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}
