//! Common utilities for provider adapters
//!
//! Key masking for `Debug` output and sanitization of upstream error bodies.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Upstream error bodies longer than this are truncated
pub const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Mask API key for safe display in logs
///
/// Shows first 4 and last 4 characters for keys longer than 8 characters,
/// otherwise shows "****" to prevent exposure of short keys.
///
/// # Examples
/// ```
/// use steelgate_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY {
        return "****".to_string();
    }
    let head: String = chars[..KEY_MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - KEY_MASK_VISIBLE_CHARS..].iter().collect();
    format!("{head}...{tail}")
}

/// Truncate a string to at most `max_bytes`, respecting char boundaries
#[must_use]
pub fn truncate_safe(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Credential-shaped substrings: bare `sk-` keys, or values following
/// `Bearer` / `api_key=` / `x-api-key:`
fn key_pattern() -> Option<&'static Regex> {
    static KEY_RE: OnceLock<Option<Regex>> = OnceLock::new();
    KEY_RE
        .get_or_init(|| {
            Regex::new(
                r#"(?i)(?P<prefix>\bbearer\s+|\b(?:x-)?api[_-]?key["']?\s*[:=]\s*["']?)(?P<secret>[A-Za-z0-9._\-]{8,})|(?P<bare>\bsk-[A-Za-z0-9_\-]{8,})"#,
            )
            .ok()
        })
        .as_ref()
}

/// Redact key material from an upstream error message
///
/// The message is otherwise passed through verbatim so callers see what the
/// upstream reported (quota exhausted, invalid model, ...). Long bodies are
/// truncated.
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let redacted = match key_pattern() {
        Some(re) => re
            .replace_all(error, |caps: &Captures<'_>| match caps.name("bare") {
                Some(bare) => mask_api_key(bare.as_str()),
                None => format!(
                    "{}{}",
                    caps.name("prefix").map_or("", |m| m.as_str()),
                    mask_api_key(caps.name("secret").map_or("", |m| m.as_str()))
                ),
            })
            .into_owned(),
        None => return "upstream error (message withheld)".to_string(),
    };

    if redacted.len() > MAX_ERROR_MESSAGE_LEN {
        format!(
            "{}...(truncated)",
            truncate_safe(&redacted, MAX_ERROR_MESSAGE_LEN)
        )
    } else {
        redacted
    }
}
