//! Cache Value Module
//!
//! Storable values and TTL inputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// == Cache Value ==
/// A scalar that can be held by a cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl CacheValue {
    /// Interprets the value as a classification outcome.
    ///
    /// `false`, `0` and the empty string are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CacheValue::Bool(b) => *b,
            CacheValue::Int(i) => *i != 0,
            CacheValue::Str(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Int(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Str(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Str(value)
    }
}

// == Ttl ==
/// Time-to-live input for a write.
///
/// Zero or negative lifetimes are accepted and mean "do not store".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Whole seconds
    Seconds(i64),
    /// Arbitrary (possibly negative) interval
    Interval(Duration),
}

/// Lifetime of a record computed from a [`Ttl`] at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// The record is never written
    Discard,
    /// The record expires at the given instant
    Until(DateTime<Utc>),
    /// The record never expires
    Forever,
}

impl Ttl {
    /// Returns false if a write with this TTL must not be observable.
    pub fn is_storable(&self) -> bool {
        match self {
            Ttl::Seconds(secs) => *secs > 0,
            Ttl::Interval(interval) => *interval > Duration::zero(),
        }
    }

    // == Lifetime ==
    /// Resolves the TTL against `now`.
    ///
    /// A lifetime that overflows the calendar is treated as never expiring.
    pub fn lifetime_from(&self, now: DateTime<Utc>) -> Lifetime {
        if !self.is_storable() {
            return Lifetime::Discard;
        }
        let interval = match self {
            Ttl::Seconds(secs) => Duration::try_seconds(*secs),
            Ttl::Interval(interval) => Some(*interval),
        };
        match interval.and_then(|d| now.checked_add_signed(d)) {
            Some(deadline) => Lifetime::Until(deadline),
            None => Lifetime::Forever,
        }
    }
}

/// Resolves an optional TTL; `None` means store forever.
pub fn lifetime_of(ttl: Option<Ttl>, now: DateTime<Utc>) -> Lifetime {
    ttl.map_or(Lifetime::Forever, |ttl| ttl.lifetime_from(now))
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<Duration> for Ttl {
    fn from(interval: Duration) -> Self {
        Ttl::Interval(interval)
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(interval: std::time::Duration) -> Self {
        match Duration::from_std(interval) {
            Ok(interval) => Ttl::Interval(interval),
            // Out of range for chrono: larger than any meaningful lifetime
            Err(_) => Ttl::Seconds(i64::MAX),
        }
    }
}
