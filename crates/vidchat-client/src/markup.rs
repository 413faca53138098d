//! Extraction from volatile page markup.
//!
//! Everything that depends on the exact shape of the homepage HTML or on the
//! response guard prefix lives here, so a markup change touches one file and
//! its contract tests.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::Result;

/// Anti-hijacking prefix in front of JSON responses.
pub const JSON_GUARD: &str = "for (;;);";

static DATR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"_js_datr","([^"]+)"#).expect("Invalid datr regex"));

static LSD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input.*?name="lsd".*?value="([^"]+)[^>]*>"#).expect("Invalid lsd regex")
});

/// The anti-automation `datr` token embedded in page scripts.
pub fn extract_datr(html: &str) -> Option<&str> {
    capture(&DATR_REGEX, html)
}

/// The `lsd` form token from its hidden input.
pub fn extract_lsd(html: &str) -> Option<&str> {
    capture(&LSD_REGEX, html)
}

fn capture<'h>(regex: &Regex, haystack: &'h str) -> Option<&'h str> {
    regex
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Strip the guard prefix, if present.
pub fn strip_guard(body: &str) -> &str {
    let trimmed = body.trim_start();
    trimmed.strip_prefix(JSON_GUARD).unwrap_or(trimmed)
}

/// Parse a possibly guarded JSON response body.
pub fn parse_guarded_json(body: &str) -> Result<Value> {
    Ok(serde_json::from_str(strip_guard(body))?)
}
