//! Rule Evaluation
//!
//! The evaluator capability consulted on cache misses, plus a small built-in
//! signature table.

use regex::{Regex, RegexBuilder};

use crate::cache::CacheValue;

// == Rule Evaluator Capability ==
/// Classifies a user agent for one named check.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, check: &str, user_agent: &str, headers: &[(String, String)]) -> CacheValue;
}

impl<F> RuleEvaluator for F
where
    F: Fn(&str, &str, &[(String, String)]) -> CacheValue + Send + Sync,
{
    fn evaluate(&self, check: &str, user_agent: &str, headers: &[(String, String)]) -> CacheValue {
        self(check, user_agent, headers)
    }
}

const PHONE_PATTERNS: &[(&str, &str)] = &[
    ("iPhone", r"\biPhone\b|\biPod\b"),
    ("AndroidPhone", r"Android.*Mobile"),
    ("BlackBerry", r"BlackBerry|\bBB10\b|RIM[0-9]+"),
    ("WindowsPhone", r"Windows Phone|Windows Mobile"),
];

const TABLET_PATTERNS: &[(&str, &str)] = &[
    ("iPad", r"\biPad\b"),
    ("Kindle", r"Kindle|Silk.*Accelerated"),
    ("GenericTablet", r"\bTablet\b"),
];

const OS_PATTERNS: &[(&str, &str)] = &[
    ("iOS", r"\biPhone.*Mobile|\biPod|\biPad|AppleCoreMedia"),
    ("AndroidOS", r"Android"),
];

// == Signature Rules ==
/// Case-insensitive regex rules keyed by check name.
///
/// `mobile` is true for any phone or tablet rule, `tablet` for any tablet
/// rule. Unknown checks evaluate to `false`.
#[derive(Debug, Clone)]
pub struct SignatureRules {
    phones: Vec<(String, Regex)>,
    tablets: Vec<(String, Regex)>,
    others: Vec<(String, Regex)>,
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn compile_all(patterns: &[(&str, &str)]) -> Result<Vec<(String, Regex)>, regex::Error> {
    patterns
        .iter()
        .map(|(name, pattern)| compile(pattern).map(|regex| (name.to_string(), regex)))
        .collect()
}

impl SignatureRules {
    /// Builds the built-in table.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            phones: compile_all(PHONE_PATTERNS)?,
            tablets: compile_all(TABLET_PATTERNS)?,
            others: compile_all(OS_PATTERNS)?,
        })
    }

    /// Adds or replaces a standalone rule.
    pub fn with_rule(mut self, check: &str, pattern: &str) -> Result<Self, regex::Error> {
        let regex = compile(pattern)?;
        self.others.retain(|(name, _)| !name.eq_ignore_ascii_case(check));
        self.others.push((check.to_string(), regex));
        Ok(self)
    }

    fn any_match(rules: &[(String, Regex)], user_agent: &str) -> bool {
        rules.iter().any(|(_, regex)| regex.is_match(user_agent))
    }

    fn named_match(&self, check: &str, user_agent: &str) -> bool {
        self.phones
            .iter()
            .chain(&self.tablets)
            .chain(&self.others)
            .filter(|(name, _)| name.eq_ignore_ascii_case(check))
            .any(|(_, regex)| regex.is_match(user_agent))
    }

    /// True if the user agent matches any tablet rule.
    pub fn is_tablet(&self, user_agent: &str) -> bool {
        Self::any_match(&self.tablets, user_agent)
    }

    /// True if the user agent matches any phone or tablet rule.
    pub fn is_mobile(&self, user_agent: &str) -> bool {
        Self::any_match(&self.phones, user_agent) || self.is_tablet(user_agent)
    }
}

impl RuleEvaluator for SignatureRules {
    fn evaluate(&self, check: &str, user_agent: &str, _headers: &[(String, String)]) -> CacheValue {
        let matched = if check.eq_ignore_ascii_case("mobile") {
            self.is_mobile(user_agent)
        } else if check.eq_ignore_ascii_case("tablet") {
            self.is_tablet(user_agent)
        } else {
            self.named_match(check, user_agent)
        };
        CacheValue::Bool(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPAD: &str = "iPad; AppleWebKit/533.17.9 Version/5.0.2 Mobile/8C148 Safari/6533.18.5";
    const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

    fn rules() -> SignatureRules {
        SignatureRules::new().unwrap()
    }

    #[test]
    fn test_ipad_is_mobile_and_tablet() {
        let rules = rules();
        for check in ["mobile", "tablet", "iPad", "iOS"] {
            assert_eq!(rules.evaluate(check, IPAD, &[]), CacheValue::Bool(true), "{}", check);
        }
        assert_eq!(rules.evaluate("iPhone", IPAD, &[]), CacheValue::Bool(false));
    }

    #[test]
    fn test_iphone_is_mobile_not_tablet() {
        let rules = rules();
        assert!(rules.is_mobile("Some iPhone user agent"));
        assert!(!rules.is_tablet("Some iPhone user agent"));
    }

    #[test]
    fn test_desktop_is_neither() {
        let rules = rules();
        assert!(!rules.is_mobile(DESKTOP));
        assert_eq!(rules.evaluate("AndroidOS", DESKTOP, &[]), CacheValue::Bool(false));
    }

    #[test]
    fn test_unknown_check_is_false() {
        assert_eq!(rules().evaluate("toaster", IPAD, &[]), CacheValue::Bool(false));
    }

    #[test]
    fn test_with_rule_adds_check() {
        let rules = rules().with_rule("Firefox", r"Firefox/\d+").unwrap();
        assert_eq!(rules.evaluate("firefox", DESKTOP, &[]), CacheValue::Bool(true));
    }

    #[test]
    fn test_closure_is_an_evaluator() {
        let evaluator = |check: &str, _ua: &str, _h: &[(String, String)]| CacheValue::from(check);
        assert_eq!(evaluator.evaluate("iOS", "UA", &[]), CacheValue::from("iOS"));
    }
}
