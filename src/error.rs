//! Error types for the cache and the detector
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by a cache store.
///
/// A malformed key is the only checked failure. Misses and expired records are
/// reported as `None`, never as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key is empty, too long, or contains a forbidden character
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == Detect Error Enum ==
/// Errors raised by a check method on the detector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// Caching is misconfigured for the named check
    #[error("Cache problem in {check}(): {reason}")]
    Configuration {
        /// Check that triggered the failure
        check: String,
        /// Human readable cause
        reason: String,
    },
}

impl DetectError {
    /// Builds a configuration error for `check`.
    pub fn configuration(check: &str, reason: impl Into<String>) -> Self {
        DetectError::Configuration {
            check: check.to_string(),
            reason: reason.into(),
        }
    }
}

// == Result Type Aliases ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Convenience Result type for detector checks.
pub type DetectResult<T> = std::result::Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_check() {
        let err = DetectError::configuration("isMobile", "cache key function is not callable");
        assert_eq!(
            err.to_string(),
            "Cache problem in isMobile(): cache key function is not callable"
        );
    }

    #[test]
    fn test_invalid_key_message() {
        let err = CacheError::InvalidKey("key must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid key: key must not be empty");
    }
}
