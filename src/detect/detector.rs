//! Detector Module
//!
//! Memoizes rule evaluations through a cache store. A classification is
//! computed at most once per (check, user agent, headers) while its record is
//! live.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheStore, CacheValue, Ttl, TtlStore};
use crate::config::DetectorConfig;
use crate::detect::{flatten_headers, user_agent_from, KeyCodec, RuleEvaluator};
use crate::error::{DetectError, DetectResult};

// == Cache Backend ==
enum Backend {
    /// Store created for and owned by this detector
    Owned(Arc<TtlStore>),
    /// Store supplied by the caller, possibly shared
    Injected(Arc<dyn CacheStore>),
    /// Every check goes straight to the evaluator
    Disabled,
}

// == Detector ==
/// Answers named checks for one bound user agent.
///
/// # Example
/// ```
/// use ua_memo::{Detector, SignatureRules};
///
/// let mut detect = Detector::new(SignatureRules::new().unwrap());
/// detect.set_user_agent("Some iPhone user agent");
/// assert!(detect.is_mobile().unwrap());
/// assert!(!detect.is_tablet().unwrap());
/// ```
pub struct Detector {
    evaluator: Box<dyn RuleEvaluator>,
    backend: Backend,
    codec: KeyCodec,
    ttl: Option<Ttl>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl Detector {
    // == Constructors ==
    /// Creates a detector with its own in-memory cache and default options.
    pub fn new(evaluator: impl RuleEvaluator + 'static) -> Self {
        Self::with_config(evaluator, DetectorConfig::default())
    }

    /// Creates a detector with its own in-memory cache.
    pub fn with_config(evaluator: impl RuleEvaluator + 'static, config: DetectorConfig) -> Self {
        let store = Arc::new(TtlStore::with_max_key_length(config.max_key_length));
        Self::build(evaluator, Backend::Owned(store), config)
    }

    /// Creates a detector backed by a caller supplied store.
    ///
    /// The configuration is not checked here; a bad key function surfaces on
    /// the first check.
    pub fn with_cache(
        evaluator: impl RuleEvaluator + 'static,
        cache: Arc<dyn CacheStore>,
        config: DetectorConfig,
    ) -> Self {
        Self::build(evaluator, Backend::Injected(cache), config)
    }

    /// Creates a detector that never caches.
    pub fn without_cache(evaluator: impl RuleEvaluator + 'static) -> Self {
        Self::build(evaluator, Backend::Disabled, DetectorConfig::default())
    }

    fn build(evaluator: impl RuleEvaluator + 'static, backend: Backend, config: DetectorConfig) -> Self {
        Self {
            evaluator: Box::new(evaluator),
            backend,
            codec: KeyCodec::new(config.cache_key_fn, config.max_key_length),
            ttl: config.ttl,
            user_agent: None,
            headers: Vec::new(),
        }
    }

    // == Session ==
    /// Binds the user agent later checks classify.
    ///
    /// Cached records are keyed by user agent, so the store is left untouched.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = Some(user_agent.into());
    }

    /// The bound user agent, if any.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Binds the request headers, in order.
    ///
    /// An `HTTP_USER_AGENT` header rebinds the user agent; without one the
    /// current agent stays bound.
    pub fn set_http_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        if let Some(user_agent) = user_agent_from(&self.headers) {
            self.user_agent = Some(user_agent.to_string());
        }
    }

    /// The bound request headers.
    pub fn http_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    // == Cache Access ==
    /// The store checks are memoized in, if any.
    pub fn cache(&self) -> Option<&dyn CacheStore> {
        match &self.backend {
            Backend::Owned(store) => Some(&**store as &dyn CacheStore),
            Backend::Injected(store) => Some(&**store),
            Backend::Disabled => None,
        }
    }

    /// The store this detector created for itself, if it did.
    pub fn default_cache(&self) -> Option<&Arc<TtlStore>> {
        match &self.backend {
            Backend::Owned(store) => Some(store),
            _ => None,
        }
    }

    // == Evaluate ==
    /// Returns the classification for `check`, reading through the cache.
    ///
    /// On a hit the evaluator is not called and nothing is written. On a miss
    /// the evaluator runs once and its result is stored with the configured TTL.
    ///
    /// # Errors
    /// `DetectError::Configuration` naming `check` when no user agent is bound,
    /// the key cannot be derived, or the store rejects the key.
    pub fn evaluate(&self, check: &str) -> DetectResult<CacheValue> {
        let user_agent = self.user_agent.as_deref().ok_or_else(|| {
            warn!(check, "check called before a user agent was set");
            DetectError::configuration(check, "no user agent has been set")
        })?;

        let store = match self.cache() {
            Some(store) => store,
            None => return Ok(self.evaluator.evaluate(check, user_agent, &self.headers)),
        };

        let context = flatten_headers(&self.headers);
        let key = self
            .codec
            .derive_key(check, user_agent, &context)
            .map_err(|err| {
                warn!(check, error = %err, "cache key derivation failed");
                err
            })?;

        let cached = store.get(&key).map_err(|err| {
            warn!(check, error = %err, "cache lookup rejected key");
            DetectError::configuration(check, err.to_string())
        })?;
        if let Some(value) = cached {
            debug!(check, key = %key, "cache hit");
            return Ok(value);
        }

        let value = self.evaluator.evaluate(check, user_agent, &self.headers);
        let stored = store.set(&key, value.clone(), self.ttl).map_err(|err| {
            warn!(check, error = %err, "cache write rejected key");
            DetectError::configuration(check, err.to_string())
        })?;
        debug!(check, key = %key, stored, "cache miss, evaluated");

        Ok(value)
    }

    // == Checks ==
    /// Returns whether `check` holds for the bound user agent.
    pub fn is(&self, check: &str) -> DetectResult<bool> {
        Ok(self.evaluate(check)?.is_truthy())
    }

    /// Phone or tablet.
    pub fn is_mobile(&self) -> DetectResult<bool> {
        self.is("mobile")
    }

    /// Tablet only.
    pub fn is_tablet(&self) -> DetectResult<bool> {
        self.is("tablet")
    }

    /// iPhone or iPod.
    pub fn is_iphone(&self) -> DetectResult<bool> {
        self.is("iPhone")
    }

    /// iPad.
    pub fn is_ipad(&self) -> DetectResult<bool> {
        self.is("iPad")
    }

    /// Any iOS device.
    pub fn is_ios(&self) -> DetectResult<bool> {
        self.is("iOS")
    }

    /// Any Android device.
    pub fn is_android_os(&self) -> DetectResult<bool> {
        self.is("AndroidOS")
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{digest, CacheKeyFn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const IPAD: &str = "iPad; AppleWebKit/533.17.9 Version/5.0.2 Mobile/8C148 Safari/6533.18.5";

    fn counting_evaluator(calls: Arc<AtomicUsize>) -> impl RuleEvaluator {
        move |check: &str, _ua: &str, _h: &[(String, String)]| {
            calls.fetch_add(1, Ordering::SeqCst);
            CacheValue::Bool(check != "desktop")
        }
    }

    #[test]
    fn test_missing_user_agent_is_configuration_error() {
        let detect = Detector::without_cache(counting_evaluator(Arc::default()));
        let err = detect.is_mobile().unwrap_err();
        assert!(matches!(err, DetectError::Configuration { ref check, .. } if check == "mobile"));
    }

    #[test]
    fn test_repeated_check_evaluates_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detect = Detector::new(counting_evaluator(Arc::clone(&calls)));
        detect.set_user_agent(IPAD);

        for _ in 0..5 {
            assert!(detect.is_mobile().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let store = detect.default_cache().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get_keys().contains(&digest(&format!("mobile:{}:", IPAD))));
    }

    #[test]
    fn test_without_cache_always_evaluates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detect = Detector::without_cache(counting_evaluator(Arc::clone(&calls)));
        detect.set_user_agent(IPAD);

        detect.is_tablet().unwrap();
        detect.is_tablet().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(detect.cache().is_none());
    }

    #[test]
    fn test_headers_are_part_of_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detect = Detector::new(counting_evaluator(Arc::clone(&calls)));
        detect.set_user_agent(IPAD);
        detect.is_ios().unwrap();

        detect.set_http_headers([("HTTP_ACCEPT", "text/html")]);
        detect.is_ios().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(detect
            .default_cache()
            .unwrap()
            .get_keys()
            .contains(&digest(&format!("iOS:{}:HTTP_ACCEPT: text/html", IPAD))));
    }

    #[test]
    fn test_headers_supply_user_agent() {
        let mut detect = Detector::without_cache(counting_evaluator(Arc::default()));
        detect.set_http_headers([("HTTP_USER_AGENT", "Mozilla/5.0 iPhone;")]);
        assert_eq!(detect.user_agent(), Some("Mozilla/5.0 iPhone;"));
    }

    #[test]
    fn test_rebinding_headers_rebinds_user_agent() {
        let desktop = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
        let mut detect = Detector::new(crate::detect::SignatureRules::new().unwrap());

        detect.set_http_headers([("HTTP_USER_AGENT", IPAD)]);
        assert!(detect.is_tablet().unwrap());

        detect.set_http_headers([("HTTP_USER_AGENT", desktop), ("HTTP_ACCEPT", "text/html")]);
        assert_eq!(detect.user_agent(), Some(desktop));
        assert!(!detect.is_tablet().unwrap());

        // Headers without a user agent leave the bound one alone
        detect.set_http_headers([("HTTP_ACCEPT", "text/html")]);
        assert_eq!(detect.user_agent(), Some(desktop));
    }

    #[test]
    fn test_rebinding_user_agent_keeps_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detect = Detector::new(counting_evaluator(Arc::clone(&calls)));

        detect.set_user_agent("first agent");
        detect.is_mobile().unwrap();
        detect.set_user_agent("second agent");
        detect.is_mobile().unwrap();
        detect.set_user_agent("first agent");
        detect.is_mobile().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(detect.default_cache().unwrap().len(), 2);
    }

    #[test]
    fn test_non_storable_ttl_still_returns_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = DetectorConfig::default().with_ttl(Ttl::Seconds(0));
        let mut detect = Detector::with_config(counting_evaluator(Arc::clone(&calls)), config);
        detect.set_user_agent(IPAD);

        assert!(detect.is_mobile().unwrap());
        assert!(detect.is_mobile().unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(detect.default_cache().unwrap().is_empty());
    }

    #[test]
    fn test_not_callable_key_fn_fails_on_first_use_only() {
        let config = DetectorConfig::default().with_cache_key_fn(CacheKeyFn::named("not a function"));
        let mut detect = Detector::with_config(counting_evaluator(Arc::default()), config);
        detect.set_user_agent(IPAD);

        let err = detect.is_mobile().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cache problem in mobile(): cache key function is not callable"
        );
    }

    #[test]
    fn test_string_values_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut detect = Detector::new(move |check: &str, _ua: &str, _h: &[(String, String)]| {
            counter.fetch_add(1, Ordering::SeqCst);
            CacheValue::from(format!("{}-version", check))
        });
        detect.set_user_agent(IPAD);

        assert_eq!(detect.evaluate("iOS").unwrap(), CacheValue::from("iOS-version"));
        assert_eq!(detect.evaluate("iOS").unwrap(), CacheValue::from("iOS-version"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
