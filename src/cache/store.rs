//! Cache Store Module
//!
//! The store capability used by the detector, and the in-memory TTL store that
//! fills it by default.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::cache::{
    lifetime_of, validate_key, CacheRecord, CacheStats, CacheValue, Lifetime, Ttl,
    DEFAULT_MAX_KEY_LENGTH,
};
use crate::error::Result;

// == Cache Store Capability ==
/// Operations a key-value cache must support to back the detector.
///
/// Every method that accepts a key fails with `CacheError::InvalidKey` for a
/// malformed key. Expired records behave exactly like absent ones.
pub trait CacheStore: Send + Sync {
    /// Returns the live value under `key`, or `None`.
    fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Stores `value` under `key`.
    ///
    /// `ttl` of `None` stores forever. A zero or negative TTL removes any
    /// existing record and returns `Ok(false)`.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<Ttl>) -> Result<bool>;

    /// Removes the record under `key`; missing keys are a no-op.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every record.
    fn clear(&self) -> bool;

    /// Returns true iff a live record exists under `key`.
    fn has(&self, key: &str) -> Result<bool>;

    /// Checks `key` against the store's key rules without touching records.
    ///
    /// Defaults to the rules of [`validate_key`] with the digest-sized bound;
    /// stores with a different bound override it.
    fn check_key(&self, key: &str) -> Result<()> {
        validate_key(key, DEFAULT_MAX_KEY_LENGTH)
    }

    /// Looks up every key, preserving the requested order.
    fn get_multiple(&self, keys: &[&str]) -> Result<Vec<(String, Option<CacheValue>)>> {
        keys.iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Stores every pair with a shared TTL.
    ///
    /// All keys are validated before anything is written. Returns false when
    /// any write was not stored; the other writes still happened.
    fn set_multiple(&self, values: &[(&str, CacheValue)], ttl: Option<Ttl>) -> Result<bool> {
        for (key, _) in values {
            self.check_key(key)?;
        }
        let mut stored = true;
        for (key, value) in values {
            stored &= self.set(key, value.clone(), ttl)?;
        }
        Ok(stored)
    }

    /// Removes every listed key; missing keys are a no-op.
    fn delete_multiple(&self, keys: &[&str]) -> Result<bool> {
        for key in keys {
            self.check_key(key)?;
        }
        for key in keys {
            self.delete(key)?;
        }
        Ok(true)
    }
}

// == TTL Store ==
/// Thread-safe in-memory store with lazy TTL expiration.
///
/// Writers take the map's write lock, so a reader never sees a partially
/// written record. Expired records are purged when a read notices them or when
/// [`TtlStore::cleanup_expired`] runs.
#[derive(Debug)]
pub struct TtlStore {
    /// Key-record storage
    records: RwLock<HashMap<String, CacheRecord>>,
    /// Read statistics
    stats: Mutex<CacheStats>,
    /// Maximum accepted key length in bytes
    max_key_length: usize,
}

impl TtlStore {
    // == Constructor ==
    /// Creates an empty store accepting keys up to the digest length.
    pub fn new() -> Self {
        Self::with_max_key_length(DEFAULT_MAX_KEY_LENGTH)
    }

    /// Creates an empty store with a custom key length bound.
    pub fn with_max_key_length(max_key_length: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            stats: Mutex::new(CacheStats::new()),
            max_key_length,
        }
    }

    /// Maximum accepted key length in bytes.
    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    // == Live Lookup ==
    /// Returns the value under `key` if live, purging it if expired.
    fn live_value(&self, key: &str, now: DateTime<Utc>) -> Option<CacheValue> {
        {
            let records = self.records.read();
            match records.get(key) {
                Some(record) if !record.is_expired_at(now) => return Some(record.value.clone()),
                None => return None,
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a writer may have refreshed the key.
        let mut records = self.records.write();
        if records.get(key).is_some_and(|r| r.is_expired_at(now)) {
            if let Some(record) = records.remove(key) {
                self.stats.lock().record_expirations(1);
                trace!(key, created_at = %record.created_at, "purged expired record");
            }
        }
        None
    }

    fn write_record(
        records: &mut HashMap<String, CacheRecord>,
        key: &str,
        value: CacheValue,
        lifetime: Lifetime,
        now: DateTime<Utc>,
    ) -> bool {
        let expires_at = match lifetime {
            Lifetime::Discard => {
                records.remove(key);
                return false;
            }
            Lifetime::Until(deadline) => Some(deadline),
            Lifetime::Forever => None,
        };
        records.insert(key.to_string(), CacheRecord::new(value, now, expires_at));
        true
    }

    // == Keys ==
    /// Returns a snapshot of the keys holding live records.
    pub fn get_keys(&self) -> HashSet<String> {
        let now = Utc::now();
        self.records
            .read()
            .iter()
            .filter(|(_, record)| !record.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Length ==
    /// Returns the number of live records.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.records
            .read()
            .values()
            .filter(|record| !record.is_expired_at(now))
            .count()
    }

    /// Returns true if no live record is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.total_entries = self.records.read().len();
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired records.
    ///
    /// Returns the number of records removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let removed = {
            let mut records = self.records.write();
            let before = records.len();
            records.retain(|_, record| !record.is_expired_at(now));
            before - records.len()
        };
        self.stats.lock().record_expirations(removed);
        removed
    }
}

impl Default for TtlStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for TtlStore {
    fn check_key(&self, key: &str) -> Result<()> {
        validate_key(key, self.max_key_length)
    }

    fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        self.check_key(key)?;
        let value = self.live_value(key, Utc::now());
        let mut stats = self.stats.lock();
        if value.is_some() {
            stats.record_hit();
        } else {
            stats.record_miss();
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Ttl>) -> Result<bool> {
        self.check_key(key)?;
        let now = Utc::now();
        let mut records = self.records.write();
        Ok(Self::write_record(&mut records, key, value, lifetime_of(ttl, now), now))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.check_key(key)?;
        self.records.write().remove(key);
        Ok(true)
    }

    fn clear(&self) -> bool {
        self.records.write().clear();
        true
    }

    fn has(&self, key: &str) -> Result<bool> {
        self.check_key(key)?;
        Ok(self.live_value(key, Utc::now()).is_some())
    }

    fn set_multiple(&self, values: &[(&str, CacheValue)], ttl: Option<Ttl>) -> Result<bool> {
        for (key, _) in values {
            self.check_key(key)?;
        }
        let now = Utc::now();
        let lifetime = lifetime_of(ttl, now);
        let mut records = self.records.write();
        let mut stored = true;
        for (key, value) in values {
            stored &= Self::write_record(&mut records, key, value.clone(), lifetime, now);
        }
        Ok(stored)
    }

    fn delete_multiple(&self, keys: &[&str]) -> Result<bool> {
        for key in keys {
            self.check_key(key)?;
        }
        let mut records = self.records.write();
        for key in keys {
            records.remove(*key);
        }
        Ok(true)
    }
}
