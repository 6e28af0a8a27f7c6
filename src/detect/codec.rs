//! Key Codec Module
//!
//! Derives cache keys for checks, either through the default SHA-1 digest or
//! through a caller supplied key function.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::cache::{validate_key, DEFAULT_MAX_KEY_LENGTH};
use crate::error::{DetectError, DetectResult};

/// Signature of a custom key function.
pub type KeyFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

// == Cache Key Function ==
/// Replacement for the default key digest.
///
/// The function receives the pre-digest `check:user_agent:context` string.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum CacheKeyFn {
    /// A function value
    Custom(KeyFn),
    /// A built-in strategy by name, resolved on first use
    Named(String),
}

impl CacheKeyFn {
    /// Wraps a closure as a key function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        CacheKeyFn::Custom(Arc::new(f))
    }

    /// Refers to a built-in strategy: `sha1`, `hex` or `identity`.
    pub fn named(name: impl Into<String>) -> Self {
        CacheKeyFn::Named(name.into())
    }

    /// Resolves the strategy to something callable.
    fn resolve(&self) -> Option<KeyFn> {
        match self {
            CacheKeyFn::Custom(f) => Some(Arc::clone(f)),
            CacheKeyFn::Named(name) => builtin(name),
        }
    }
}

impl From<String> for CacheKeyFn {
    fn from(name: String) -> Self {
        CacheKeyFn::Named(name)
    }
}

impl fmt::Debug for CacheKeyFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKeyFn::Custom(_) => f.write_str("CacheKeyFn::Custom(..)"),
            CacheKeyFn::Named(name) => write!(f, "CacheKeyFn::Named({:?})", name),
        }
    }
}

fn builtin(name: &str) -> Option<KeyFn> {
    match name {
        "sha1" => Some(Arc::new(digest)),
        "hex" => Some(Arc::new(|raw: &str| hex::encode(raw))),
        "identity" => Some(Arc::new(|raw: &str| raw.to_string())),
        _ => None,
    }
}

// == Digest ==
/// Hex-encoded SHA-1 of `raw`, always 40 characters.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha1::digest(raw.as_bytes()))
}

/// Joins the parts of a key before hashing.
pub fn raw_key(check: &str, user_agent: &str, context: &str) -> String {
    format!("{}:{}:{}", check, user_agent, context)
}

// == Key Codec ==
/// Turns `(check, user_agent, context)` into a validated store key.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    key_fn: Option<CacheKeyFn>,
    max_key_length: usize,
}

impl KeyCodec {
    /// Creates a codec; `None` selects the SHA-1 digest of `check:ua:context`.
    pub fn new(key_fn: Option<CacheKeyFn>, max_key_length: usize) -> Self {
        Self {
            key_fn,
            max_key_length,
        }
    }

    /// Maximum length of a derived key in bytes.
    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    // == Derive Key ==
    /// Derives the key for one check.
    ///
    /// # Errors
    /// `DetectError::Configuration` naming `check` when the key function cannot
    /// be resolved or produces a key the store would reject.
    pub fn derive_key(&self, check: &str, user_agent: &str, context: &str) -> DetectResult<String> {
        let raw = raw_key(check, user_agent, context);
        let key = match &self.key_fn {
            None => digest(&raw),
            Some(key_fn) => {
                let f = key_fn.resolve().ok_or_else(|| {
                    DetectError::configuration(check, "cache key function is not callable")
                })?;
                f(&raw)
            }
        };

        validate_key(&key, self.max_key_length).map_err(|err| {
            DetectError::configuration(check, format!("derived cache key is unusable: {}", err))
        })?;
        Ok(key)
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_KEY_LENGTH)
    }
}
