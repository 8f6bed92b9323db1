//! Helpers for logging provider traffic without leaking credentials.

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Bearer [A-Za-z0-9\-_\.]+", "Bearer [REDACTED]"),
        (r#"client_secret[=:"\s]+[^\s&",]+"#, "client_secret=[REDACTED]"),
        (r#"access_token["\s]*[=:]\s*"?[^\s&",]+"?"#, "access_token=[REDACTED]"),
        (r"api[_-]?key[=:]\s*[A-Za-z0-9\-_]+", "api_key=[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Truncate on a character boundary, adding an ellipsis if anything was cut.
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Mask tokens and secrets before a provider body reaches the log.
pub fn sanitize_for_logging(s: &str) -> String {
    SENSITIVE_PATTERNS
        .iter()
        .fold(s.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghij", 6), "abc...");
        assert_eq!(truncate_string("SFO → ORD → JFK", 8), "SFO →...");
    }

    #[test]
    fn test_sanitize_for_logging() {
        let body = r#"{"access_token": "abc123", "note": "Bearer xyz.789"}"#;
        let clean = sanitize_for_logging(body);
        assert!(!clean.contains("abc123"));
        assert!(!clean.contains("xyz.789"));

        let form = "grant_type=client_credentials&client_id=id&client_secret=s3cr3t";
        assert!(!sanitize_for_logging(form).contains("s3cr3t"));
    }
}
