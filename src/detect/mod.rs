//! Detect Module
//!
//! Memoized user-agent classification on top of the cache.

mod codec;
mod detector;
mod headers;
mod rules;

pub use codec::{digest, raw_key, CacheKeyFn, KeyCodec, KeyFn};
pub use detector::Detector;
pub use headers::{flatten_headers, user_agent_from, USER_AGENT_HEADER};
pub use rules::{RuleEvaluator, SignatureRules};
