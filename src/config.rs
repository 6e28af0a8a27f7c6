//! Configuration Module
//!
//! Detector and sweeper settings, loaded from environment variables or
//! deserialized from a host application's config.

use std::env;

use serde::Deserialize;

use crate::cache::{Ttl, DEFAULT_MAX_KEY_LENGTH};
use crate::detect::CacheKeyFn;

/// Construction-time options for a cache-backed detector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Lifetime of cached classifications, None = never expire
    #[serde(deserialize_with = "ttl_from_seconds")]
    pub ttl: Option<Ttl>,
    /// Replacement for the default key digest
    pub cache_key_fn: Option<CacheKeyFn>,
    /// Longest key the detector will hand to the store
    pub max_key_length: usize,
}

fn ttl_from_seconds<'de, D>(deserializer: D) -> Result<Option<Ttl>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.map(Ttl::Seconds))
}

impl DetectorConfig {
    /// Creates a new DetectorConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UA_MEMO_CACHE_TTL` - Record lifetime in seconds (default: never expire)
    /// - `UA_MEMO_CACHE_KEY_FN` - Built-in key strategy name (default: SHA-1 digest)
    /// - `UA_MEMO_MAX_KEY_LENGTH` - Maximum key length (default: 40)
    pub fn from_env() -> Self {
        Self {
            ttl: env::var("UA_MEMO_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Ttl::Seconds),
            cache_key_fn: env::var("UA_MEMO_CACHE_KEY_FN")
                .ok()
                .filter(|v| !v.is_empty())
                .map(CacheKeyFn::named),
            max_key_length: env::var("UA_MEMO_MAX_KEY_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_KEY_LENGTH),
        }
    }

    /// Sets the TTL applied to memoized records.
    pub fn with_ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Replaces the default digest key strategy.
    pub fn with_cache_key_fn(mut self, key_fn: CacheKeyFn) -> Self {
        self.cache_key_fn = Some(key_fn);
        self
    }

    /// Sets the bound derived keys are checked against.
    pub fn with_max_key_length(mut self, max_key_length: usize) -> Self {
        self.max_key_length = max_key_length;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            cache_key_fn: None,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }
}

/// Settings for the background expiry sweeper.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Interval in seconds between sweeps
    pub interval_secs: u64,
}

impl SweeperConfig {
    /// Loads `UA_MEMO_SWEEP_INTERVAL` (default: 60).
    pub fn from_env() -> Self {
        Self {
            interval_secs: env::var("UA_MEMO_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}
