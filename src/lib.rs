//! ua_memo - Memoized user-agent classification
//!
//! Answers device checks ("mobile", "tablet", "iPad", ...) through a TTL
//! key-value cache so each classification runs at most once per
//! (check, user agent, headers) while its record is live.

pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod tasks;

pub use cache::{CacheStore, CacheValue, Ttl, TtlStore};
pub use config::{DetectorConfig, SweeperConfig};
pub use detect::{CacheKeyFn, Detector, RuleEvaluator, SignatureRules};
pub use error::{CacheError, DetectError};
pub use tasks::spawn_sweep_task;
