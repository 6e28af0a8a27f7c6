//! Header Normalizer
//!
//! Flattens an HTTP header set into the canonical string used in cache keys.

/// Header carrying the user agent in a CGI style header map.
pub const USER_AGENT_HEADER: &str = "HTTP_USER_AGENT";

/// Renders headers as `NAME: value` lines joined by `\n`, in the given order.
pub fn flatten_headers(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the user agent header value, if present.
pub fn user_agent_from(headers: &[(String, String)]) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT_HEADER))
        .map(|(_, value)| value.as_str())
}
