//! Cache Key Rules
//!
//! Validity rules shared by every store operation and by key derivation.

use crate::error::{CacheError, Result};

/// Characters a key may never contain.
pub const RESERVED_KEY_CHARACTERS: &str = "{}()/\\@:";

// == Validate Key ==
/// Checks that `key` is non-empty, at most `max_length` bytes long, and free of
/// whitespace, control and reserved characters.
pub fn validate_key(key: &str, max_length: usize) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }

    if key.len() > max_length {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            max_length
        )));
    }

    if let Some(c) = key
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || RESERVED_KEY_CHARACTERS.contains(*c))
    {
        return Err(CacheError::InvalidKey(format!(
            "key contains forbidden character {:?}",
            c
        )));
    }

    Ok(())
}
